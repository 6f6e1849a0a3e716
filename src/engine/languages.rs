//! Extension → language table and per-language comment syntax.
//!
//! Both are static and read-only after first use, so walker and classifier threads share them
//! without synchronization.

use std::collections::HashMap;
use std::sync::OnceLock;

/// `(extension, language)` pairs. Extensionless files are looked up by their lowercased name
/// (e.g. `makefile`, `dockerfile`).
const EXTENSIONS: &[(&str, &str)] = &[
    ("4th", "Forth"),
    ("abap", "ABAP"),
    ("as", "ActionScript"),
    ("asa", "ASP"),
    ("asax", "ASP.NET"),
    ("ascx", "ASP.NET"),
    ("asm", "Assembly"),
    ("asmx", "ASP.NET"),
    ("asp", "ASP"),
    ("aspx", "ASP.NET"),
    ("ada", "Ada"),
    ("adb", "Ada"),
    ("ads", "Ada"),
    ("agda", "Agda"),
    ("ahk", "AutoHotKey"),
    ("bash", "BASH"),
    ("bat", "Batch"),
    ("btm", "Batch"),
    ("c", "C"),
    ("c++", "C++"),
    ("cabal", "Cabal"),
    ("cassius", "Cassius"),
    ("cbl", "COBOL"),
    ("cc", "C++"),
    ("ccp", "COBOL"),
    ("ceylon", "Ceylon"),
    ("cfc", "ColdFusion CFScript"),
    ("cfm", "ColdFusion"),
    ("ckt", "Spice Netlist"),
    ("clj", "Clojure"),
    ("cljs", "ClojureScript"),
    ("cmake", "CMake"),
    ("cmd", "Batch"),
    ("cob", "COBOL"),
    ("cobol", "COBOL"),
    ("coffee", "CoffeeScript"),
    ("cogent", "Cogent"),
    ("comp", "GLSL"),
    ("cpp", "C++"),
    ("cpy", "COBOL"),
    ("cr", "Crystal"),
    ("cs", "C#"),
    ("csh", "C Shell"),
    ("cshtml", "Razor"),
    ("csproj", "MSBuild"),
    ("css", "CSS"),
    ("cxx", "C++"),
    ("d", "D"),
    ("dart", "Dart"),
    ("def", "Module-Definition"),
    ("dockerfile", "Dockerfile"),
    ("dockerignore", "Dockerfile"),
    ("dts", "Device Tree"),
    ("dtsi", "Device Tree"),
    ("e", "Specman e"),
    ("e4", "Forth"),
    ("ec", "C"),
    ("ede", "Emacs Dev Env"),
    ("el", "Emacs Lisp"),
    ("elm", "Elm"),
    ("erl", "Erlang"),
    ("ex", "Elixir"),
    ("exs", "Elixir"),
    ("f", "FORTRAN Legacy"),
    ("f03", "FORTRAN Modern"),
    ("f08", "FORTRAN Modern"),
    ("f77", "FORTRAN Legacy"),
    ("f83", "Forth"),
    ("f90", "FORTRAN Modern"),
    ("f95", "FORTRAN Modern"),
    ("fb", "Forth"),
    ("fish", "Fish"),
    ("for", "FORTRAN Legacy"),
    ("forth", "Forth"),
    ("fpm", "Forth"),
    ("fr", "Forth"),
    ("frag", "GLSL"),
    ("frt", "Forth"),
    ("fs", "F#"),
    ("fsi", "F#"),
    ("fsproj", "MSBuild"),
    ("fsscript", "F#"),
    ("fst", "F*"),
    ("fsx", "F#"),
    ("ft", "Forth"),
    ("fth", "Forth"),
    ("ftn", "FORTRAN Legacy"),
    ("gd", "GDScript"),
    ("geom", "GLSL"),
    ("go", "Go"),
    ("groovy", "Groovy"),
    ("grt", "Groovy"),
    ("gtpl", "Groovy"),
    ("gvy", "Groovy"),
    ("h", "C Header"),
    ("hamlet", "Hamlet"),
    ("handlebars", "Handlebars"),
    ("hbs", "Handlebars"),
    ("hex", "HEX"),
    ("hh", "C++ Header"),
    ("hlean", "Lean"),
    ("hpp", "C++ Header"),
    ("hrl", "Erlang"),
    ("hs", "Haskell"),
    ("htm", "HTML"),
    ("html", "HTML"),
    ("hx", "Haxe"),
    ("hxx", "C++ Header"),
    ("idr", "Idris"),
    ("ihex", "Intel HEX"),
    ("in", "Autoconf"),
    ("inl", "C++ Header"),
    ("ipp", "C++ Header"),
    ("irunargs", "Verilog Args File"),
    ("jai", "JAI"),
    ("java", "Java"),
    ("jl", "Julia"),
    ("js", "JavaScript"),
    ("json", "JSON"),
    ("jsx", "JSX"),
    ("julius", "Julius"),
    ("kt", "Kotlin"),
    ("kts", "Kotlin"),
    ("lds", "LD Script"),
    ("lean", "Lean"),
    ("less", "LESS"),
    ("lidr", "Idris"),
    ("lisp", "Lisp"),
    ("lsp", "Lisp"),
    ("lua", "Lua"),
    ("lucius", "Lucius"),
    ("ly", "Happy"),
    ("m", "Objective C"),
    ("mad", "Madlang"),
    ("mak", "Makefile"),
    ("makefile", "Makefile"),
    ("markdown", "Markdown"),
    ("master", "ASP.NET"),
    ("md", "Markdown"),
    ("mk", "Makefile"),
    ("ml", "OCaml"),
    ("mli", "OCaml"),
    ("mm", "Objective C++"),
    ("mustache", "Mustache"),
    ("nb", "Wolfram"),
    ("nim", "Nim"),
    ("nix", "Nix"),
    ("org", "Org"),
    ("oz", "Oz"),
    ("p", "Prolog"),
    ("pad", "Ada"),
    ("pas", "Pascal"),
    ("pcc", "C++"),
    ("pde", "Processing"),
    ("pfo", "FORTRAN Legacy"),
    ("pgc", "C"),
    ("php", "PHP"),
    ("pl", "Perl"),
    ("pm", "Perl"),
    ("polly", "Polly"),
    ("pro", "Prolog"),
    ("props", "MSBuild"),
    ("proto", "Protocol Buffers"),
    ("psl", "PSL Assertion"),
    ("purs", "PureScript"),
    ("py", "Python"),
    ("qcl", "QCL"),
    ("qml", "QML"),
    ("r", "R"),
    ("rake", "Rakefile"),
    ("rb", "Ruby"),
    ("rhtml", "Ruby HTML"),
    ("rs", "Rust"),
    ("rst", "ReStructuredText"),
    ("rx", "Forth"),
    ("s", "Assembly"),
    ("sass", "Sass"),
    ("sc", "Scala"),
    ("scala", "Scala"),
    ("scm", "Scheme"),
    ("scss", "Sass"),
    ("sh", "Shell"),
    ("sitemap", "ASP.NET"),
    ("sml", "Standard ML (SML)"),
    ("sql", "SQL"),
    ("srt", "SRecode Template"),
    ("ss", "Scheme"),
    ("sty", "TeX"),
    ("sv", "SystemVerilog"),
    ("svg", "SVG"),
    ("svh", "SystemVerilog"),
    ("swift", "Swift"),
    ("targets", "MSBuild"),
    ("tcl", "TCL"),
    ("tesc", "GLSL"),
    ("tese", "GLSL"),
    ("tex", "TeX"),
    ("text", "Plain Text"),
    ("thy", "Isabelle"),
    ("toml", "TOML"),
    ("ts", "TypeScript"),
    ("tsx", "TypeScript"),
    ("txt", "Plain Text"),
    ("uc", "Unreal Script"),
    ("uci", "Unreal Script"),
    ("upkg", "Unreal Script"),
    ("ur", "Ur/Web"),
    ("urp", "Ur/Web Project"),
    ("urs", "Ur/Web"),
    ("v", "Coq"),
    ("vala", "Vala"),
    ("vb", "Visual Basic"),
    ("vbproj", "MSBuild"),
    ("vert", "GLSL"),
    ("vg", "Verilog"),
    ("vh", "Verilog"),
    ("vhd", "VHDL"),
    ("vim", "Vim Script"),
    ("vue", "Vue"),
    ("webinfo", "ASP.NET"),
    ("wl", "Wolfram"),
    ("x", "Alex"),
    ("xaml", "XAML"),
    ("xml", "XML"),
    ("xrunargs", "Verilog Args File"),
    ("xtend", "Xtend"),
    ("y", "Happy"),
    ("yaml", "YAML"),
    ("yml", "YAML"),
    ("zsh", "Zsh"),
];

static LANGUAGES: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

fn table() -> &'static HashMap<&'static str, &'static str> {
    LANGUAGES.get_or_init(|| EXTENSIONS.iter().copied().collect())
}

/// Language for a lowercased extension, or `None` if the extension is not recognized.
pub fn language_for_extension(extension: &str) -> Option<&'static str> {
    table().get(extension).copied()
}

/// Lookup key for a file name: lowercased text after the last `.`, or the whole lowercased name
/// when there is no dot. A leading dot counts (`.dockerignore` → `dockerignore`).
pub fn extension_of(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => filename.to_ascii_lowercase(),
    }
}

/// `(extension, language)` for a file name, or `None` when the language is unknown.
pub fn detect(filename: &str) -> Option<(String, &'static str)> {
    let extension = extension_of(filename);
    let language = language_for_extension(&extension)?;
    Some((extension, language))
}

/// Number of distinct extensions in the table.
pub fn known_extension_count() -> usize {
    table().len()
}

// ---- Comment syntax ----

/// How a language marks comments. Block pairs are tried before line prefixes, longest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommentSyntax {
    pub line: &'static [&'static str],
    pub block: &'static [(&'static str, &'static str)],
}

impl CommentSyntax {
    const fn new(
        line: &'static [&'static str],
        block: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self { line, block }
    }
}

const NONE: CommentSyntax = CommentSyntax::new(&[], &[]);
const C_STYLE: CommentSyntax = CommentSyntax::new(&["//"], &[("/*", "*/")]);
const CSS: CommentSyntax = CommentSyntax::new(&[], &[("/*", "*/")]);
const HASH: CommentSyntax = CommentSyntax::new(&["#"], &[]);
const DASH: CommentSyntax = CommentSyntax::new(&["--"], &[]);
const HASKELL: CommentSyntax = CommentSyntax::new(&["--"], &[("{-", "-}")]);
const LISP: CommentSyntax = CommentSyntax::new(&[";"], &[("#|", "|#")]);
const SEMICOLON: CommentSyntax = CommentSyntax::new(&[";"], &[]);
const PERCENT: CommentSyntax = CommentSyntax::new(&["%"], &[]);
const PROLOG: CommentSyntax = CommentSyntax::new(&["%"], &[("/*", "*/")]);
const ML: CommentSyntax = CommentSyntax::new(&[], &[("(*", "*)")]);
const FSHARP: CommentSyntax = CommentSyntax::new(&["//"], &[("(*", "*)")]);
const MARKUP: CommentSyntax = CommentSyntax::new(&[], &[("<!--", "-->")]);

/// Comment syntax for a language label from the table. Unknown or comment-free languages
/// (plain text, JSON, hex dumps) get no syntax: every non-blank line counts as code.
pub fn comment_syntax(language: &str) -> CommentSyntax {
    match language {
        "ActionScript" | "C" | "C Header" | "C#" | "C++" | "C++ Header" | "Ceylon"
        | "ColdFusion CFScript" | "Dart" | "Device Tree" | "Go" | "GLSL" | "Groovy" | "Haxe"
        | "JAI" | "Java" | "JavaScript" | "JSX" | "Julius" | "Kotlin" | "LESS" | "Lucius"
        | "Cassius" | "Objective C" | "Objective C++" | "Polly" | "Processing"
        | "Protocol Buffers" | "PSL Assertion" | "QCL" | "QML" | "Rust" | "Sass" | "Scala"
        | "Swift" | "SystemVerilog" | "TypeScript" | "Unreal Script" | "Vala" | "Verilog"
        | "Verilog Args File" | "Xtend" => C_STYLE,
        "D" => CommentSyntax::new(&["//"], &[("/+", "+/"), ("/*", "*/")]),
        "PHP" => CommentSyntax::new(&["//", "#"], &[("/*", "*/")]),
        "Razor" => CommentSyntax::new(&["//"], &[("@*", "*@"), ("/*", "*/")]),
        "Specman e" => CommentSyntax::new(&["--", "//"], &[]),
        "AutoHotKey" => CommentSyntax::new(&[";"], &[("/*", "*/")]),
        "Assembly" => CommentSyntax::new(&[";", "//"], &[("/*", "*/")]),
        "CSS" | "LD Script" => CSS,
        "Autoconf" | "BASH" | "C Shell" | "CMake" | "Crystal" | "Dockerfile" | "Elixir"
        | "Fish" | "GDScript" | "Madlang" | "Makefile" | "Org" | "Perl" | "Python" | "R"
        | "Rakefile" | "Shell" | "TCL" | "TOML" | "YAML" | "Zsh" => HASH,
        "Ruby" => CommentSyntax::new(&["#"], &[("=begin", "=end")]),
        "CoffeeScript" => CommentSyntax::new(&["#"], &[("###", "###")]),
        "Julia" => CommentSyntax::new(&["#"], &[("#=", "=#")]),
        "Nim" => CommentSyntax::new(&["#"], &[("#[", "]#")]),
        "Nix" => CommentSyntax::new(&["#"], &[("/*", "*/")]),
        "Ada" | "VHDL" => DASH,
        "SQL" => CommentSyntax::new(&["--"], &[("/*", "*/")]),
        "Lua" => CommentSyntax::new(&["--"], &[("--[[", "]]")]),
        "Lean" => CommentSyntax::new(&["--"], &[("/-", "-/")]),
        "Agda" | "Alex" | "Cabal" | "Cogent" | "Elm" | "Happy" | "Haskell" | "Idris"
        | "PureScript" => HASKELL,
        "Clojure" | "ClojureScript" | "Emacs Lisp" | "Lisp" | "Scheme" => LISP,
        "Emacs Dev Env" | "Module-Definition" | "SRecode Template" => SEMICOLON,
        "Erlang" | "TeX" => PERCENT,
        "Prolog" | "Oz" => PROLOG,
        "Coq" | "Isabelle" | "OCaml" | "Standard ML (SML)" | "Ur/Web" | "Wolfram" => ML,
        "F#" | "F*" => FSHARP,
        "Pascal" => CommentSyntax::new(&["//"], &[("(*", "*)"), ("{", "}")]),
        "ASP" | "ASP.NET" | "HTML" | "Markdown" | "MSBuild" | "Ruby HTML" | "SVG" | "Vue"
        | "XAML" | "XML" => MARKUP,
        "ColdFusion" => CommentSyntax::new(&[], &[("<!---", "--->")]),
        "Handlebars" => {
            CommentSyntax::new(&[], &[("{{!--", "--}}"), ("{{!", "}}"), ("<!--", "-->")])
        }
        "Mustache" => CommentSyntax::new(&[], &[("{{!", "}}")]),
        "Hamlet" => CommentSyntax::new(&["$#"], &[]),
        "Batch" => CommentSyntax::new(&["REM", "rem", "::"], &[]),
        "Visual Basic" => CommentSyntax::new(&["'", "REM"], &[]),
        "Vim Script" => CommentSyntax::new(&["\""], &[]),
        "Forth" => CommentSyntax::new(&["\\"], &[("( ", ")")]),
        "FORTRAN Legacy" | "FORTRAN Modern" => CommentSyntax::new(&["!"], &[]),
        "COBOL" => CommentSyntax::new(&["*>"], &[]),
        "ABAP" => CommentSyntax::new(&["*", "\""], &[]),
        "Spice Netlist" => CommentSyntax::new(&["*"], &[]),
        _ => NONE,
    }
}
