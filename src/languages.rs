//! Built-in language table.
//!
//! Maps file names and extensions to a [`Language`]: its display name, the
//! highlighter alias used both as lexer name and as the `lang-<alias>` CSS
//! class, and its canonical colour (GitHub's language colours).

use crate::types::Language;
use std::path::Path;

struct LanguageDef {
    name: &'static str,
    alias: &'static str,
    color: Option<&'static str>,
    extensions: &'static [&'static str],
    filenames: &'static [&'static str],
}

const fn lang(
    name: &'static str,
    alias: &'static str,
    color: Option<&'static str>,
    extensions: &'static [&'static str],
    filenames: &'static [&'static str],
) -> LanguageDef {
    LanguageDef {
        name,
        alias,
        color,
        extensions,
        filenames,
    }
}

#[rustfmt::skip]
const KNOWN: &[LanguageDef] = &[
    lang("C", "c", Some("#555555"), &["c", "h"], &[]),
    lang("C#", "csharp", Some("#178600"), &["cs"], &[]),
    lang("C++", "cpp", Some("#f34b7d"), &["cpp", "cc", "cxx", "hpp", "hh", "hxx"], &[]),
    lang("CSS", "css", Some("#563d7c"), &["css"], &[]),
    lang("Clojure", "clojure", Some("#db5855"), &["clj", "cljs", "cljc", "edn"], &[]),
    lang("Dart", "dart", Some("#00B4AB"), &["dart"], &[]),
    lang("Dockerfile", "docker", Some("#384d54"), &["dockerfile"], &["Dockerfile"]),
    lang("Elixir", "elixir", Some("#6e4a7e"), &["ex", "exs"], &[]),
    lang("Erlang", "erlang", Some("#B83998"), &["erl", "hrl"], &[]),
    lang("Go", "go", Some("#00ADD8"), &["go"], &[]),
    lang("HTML", "html", Some("#e34c26"), &["html", "htm", "xhtml"], &[]),
    lang("Haskell", "haskell", Some("#5e5086"), &["hs", "lhs"], &[]),
    lang("JSON", "json", Some("#292929"), &["json"], &[]),
    lang("Java", "java", Some("#b07219"), &["java"], &[]),
    lang("JavaScript", "javascript", Some("#f1e05a"), &["js", "mjs", "cjs", "jsx"], &[]),
    lang("Kotlin", "kotlin", Some("#A97BFF"), &["kt", "kts"], &[]),
    lang("Lua", "lua", Some("#000080"), &["lua"], &[]),
    lang("Makefile", "make", Some("#427819"), &["mk", "mak"], &["Makefile", "makefile", "GNUmakefile"]),
    lang("Markdown", "markdown", Some("#083fa1"), &["md", "markdown"], &[]),
    lang("Nix", "nix", Some("#7e7eff"), &["nix"], &[]),
    lang("OCaml", "ocaml", Some("#ef7a08"), &["ml", "mli"], &[]),
    lang("Objective-C", "objective-c", Some("#438eff"), &["m"], &[]),
    lang("PHP", "php", Some("#4F5D95"), &["php"], &[]),
    lang("Perl", "perl", Some("#0298c3"), &["pl", "pm"], &[]),
    lang("Python", "python", Some("#3572A5"), &["py", "pyi", "pyw"], &["SConstruct", "SConscript"]),
    lang("R", "r", Some("#198CE7"), &["r"], &[]),
    lang("Ruby", "ruby", Some("#701516"), &["rb", "rake", "gemspec", "ru"], &["Rakefile", "Gemfile", "Guardfile"]),
    lang("Rust", "rust", Some("#dea584"), &["rs"], &[]),
    lang("SCSS", "scss", Some("#c6538c"), &["scss"], &[]),
    lang("SQL", "sql", Some("#e38c00"), &["sql"], &[]),
    lang("Scala", "scala", Some("#c22d40"), &["scala", "sc"], &[]),
    lang("Shell", "shell", Some("#89e051"), &["sh", "bash", "zsh", "ksh"], &[".bashrc", ".zshrc", ".profile"]),
    lang("Swift", "swift", Some("#F05138"), &["swift"], &[]),
    lang("TOML", "toml", Some("#9c4221"), &["toml"], &[]),
    lang("Text", "text", None, &["txt"], &[]),
    lang("TypeScript", "typescript", Some("#3178c6"), &["ts", "tsx", "mts", "cts"], &[]),
    lang("Vim Script", "vim", Some("#199f4b"), &["vim"], &[".vimrc"]),
    lang("YAML", "yaml", Some("#cb171e"), &["yml", "yaml"], &[]),
    lang("Zig", "zig", Some("#ec915c"), &["zig"], &[]),
];

impl LanguageDef {
    fn to_language(&self) -> Language {
        Language {
            name: self.name.to_string(),
            alias: self.alias.to_string(),
            color: self.color.map(String::from),
        }
    }
}

/// Every known language, in table order.
pub fn all() -> Vec<Language> {
    KNOWN.iter().map(LanguageDef::to_language).collect()
}

/// Detect a language from a path: exact file name first, then extension.
pub fn detect(path: &Path) -> Option<Language> {
    let file_name = path.file_name()?.to_string_lossy();
    if let Some(def) = KNOWN.iter().find(|d| d.filenames.contains(&file_name.as_ref())) {
        return Some(def.to_language());
    }
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    KNOWN
        .iter()
        .find(|d| d.extensions.contains(&ext.as_str()))
        .map(LanguageDef::to_language)
}
