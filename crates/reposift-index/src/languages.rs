//! Extension table, splitter separators, and function grammar registry.

use serde::{Deserialize, Serialize};

/// Language recognized by the preprocessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Python,
    JavaScript,
    Cpp,
    Java,
    Php,
    Go,
    Rst,
    Scala,
    Swift,
    Markdown,
    Latex,
    Html,
    Solidity,
    Proto,
}

const EXTENSIONS: &[(&str, Lang)] = &[
    ("py", Lang::Python),
    ("js", Lang::JavaScript),
    ("cpp", Lang::Cpp),
    ("java", Lang::Java),
    ("php", Lang::Php),
    ("go", Lang::Go),
    ("rst", Lang::Rst),
    ("scala", Lang::Scala),
    ("swift", Lang::Swift),
    ("md", Lang::Markdown),
    ("tex", Lang::Latex),
    ("html", Lang::Html),
    ("sol", Lang::Solidity),
    ("proto", Lang::Proto),
];

/// Tree-sitter grammar for extracting top-level functions.
#[derive(Clone)]
pub struct FunctionGrammar {
    pub language: tree_sitter::Language,
    /// Node kinds that are function definitions.
    pub function_kinds: &'static [&'static str],
    /// Wrapper node whose `definition` field may hold a function.
    pub decorated_kind: Option<&'static str>,
}

impl std::fmt::Debug for FunctionGrammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionGrammar")
            .field("function_kinds", &self.function_kinds)
            .field("decorated_kind", &self.decorated_kind)
            .finish_non_exhaustive()
    }
}

impl Lang {
    pub const ALL: [Self; 14] = [
        Self::Python,
        Self::JavaScript,
        Self::Cpp,
        Self::Java,
        Self::Php,
        Self::Go,
        Self::Rst,
        Self::Scala,
        Self::Swift,
        Self::Markdown,
        Self::Latex,
        Self::Html,
        Self::Solidity,
        Self::Proto,
    ];

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::Cpp => "cpp",
            Self::Java => "java",
            Self::Php => "php",
            Self::Go => "go",
            Self::Rst => "rst",
            Self::Scala => "scala",
            Self::Swift => "swift",
            Self::Markdown => "markdown",
            Self::Latex => "latex",
            Self::Html => "html",
            Self::Solidity => "solidity",
            Self::Proto => "proto",
        }
    }

    /// Look up an extension given without the leading dot. Case-sensitive.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        EXTENSIONS
            .iter()
            .find_map(|(e, lang)| (*e == ext).then_some(*lang))
    }

    /// Language of a snapshot path: the text after its last `.`, even when
    /// that dot sits in a directory name. A path without a dot matches nothing.
    #[must_use]
    pub fn for_path(path: &str) -> Option<Self> {
        let (_, ext) = path.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    /// Regex separators for the recursive splitter, most syntactic first.
    /// The empty pattern means "split into single characters".
    #[must_use]
    pub fn separators(self) -> &'static [&'static str] {
        match self {
            Self::Python => &["\nclass ", "\ndef ", "\n\tdef ", "\n\n", "\n", " ", ""],
            Self::JavaScript => &[
                "\nfunction ",
                "\nconst ",
                "\nlet ",
                "\nvar ",
                "\nclass ",
                "\nif ",
                "\nfor ",
                "\nwhile ",
                "\nswitch ",
                "\ncase ",
                "\ndefault ",
                "\n\n",
                "\n",
                " ",
                "",
            ],
            Self::Cpp => &[
                "\nclass ",
                "\nvoid ",
                "\nint ",
                "\nfloat ",
                "\ndouble ",
                "\nif ",
                "\nfor ",
                "\nwhile ",
                "\nswitch ",
                "\ncase ",
                "\n\n",
                "\n",
                " ",
                "",
            ],
            Self::Java => &[
                "\nclass ",
                "\npublic ",
                "\nprotected ",
                "\nprivate ",
                "\nstatic ",
                "\nif ",
                "\nfor ",
                "\nwhile ",
                "\nswitch ",
                "\ncase ",
                "\n\n",
                "\n",
                " ",
                "",
            ],
            Self::Php => &[
                "\nfunction ",
                "\nclass ",
                "\nif ",
                "\nforeach ",
                "\nwhile ",
                "\ndo ",
                "\nswitch ",
                "\ncase ",
                "\n\n",
                "\n",
                " ",
                "",
            ],
            Self::Go => &[
                "\nfunc ",
                "\nvar ",
                "\nconst ",
                "\ntype ",
                "\nif ",
                "\nfor ",
                "\nswitch ",
                "\ncase ",
                "\n\n",
                "\n",
                " ",
                "",
            ],
            Self::Rst => &[
                r"\n=+\n",
                r"\n-+\n",
                r"\n\*+\n",
                r"\n\n.. *\n\n",
                "\n\n",
                "\n",
                " ",
                "",
            ],
            Self::Scala => &[
                "\nclass ",
                "\nobject ",
                "\ndef ",
                "\nval ",
                "\nvar ",
                "\nif ",
                "\nfor ",
                "\nwhile ",
                "\nmatch ",
                "\ncase ",
                "\n\n",
                "\n",
                " ",
                "",
            ],
            Self::Swift => &[
                "\nfunc ",
                "\nclass ",
                "\nstruct ",
                "\nenum ",
                "\nif ",
                "\nfor ",
                "\nwhile ",
                "\ndo ",
                "\nswitch ",
                "\ncase ",
                "\n\n",
                "\n",
                " ",
                "",
            ],
            Self::Markdown => &[
                r"\n#{1,6} ",
                "```\n",
                r"\n\*\*\*+\n",
                r"\n---+\n",
                r"\n___+\n",
                "\n\n",
                "\n",
                " ",
                "",
            ],
            Self::Latex => &[
                r"\n\\chapter\{",
                r"\n\\section\{",
                r"\n\\subsection\{",
                r"\n\\subsubsection\{",
                r"\n\\begin\{enumerate\}",
                r"\n\\begin\{itemize\}",
                r"\n\\begin\{description\}",
                r"\n\\begin\{list\}",
                r"\n\\begin\{quote\}",
                r"\n\\begin\{quotation\}",
                r"\n\\begin\{verse\}",
                r"\n\\begin\{verbatim\}",
                r"\n\\begin\{align\}",
                r"\$\$",
                r"\$",
                " ",
                "",
            ],
            Self::Html => &[
                "<body", "<div", "<p", "<br", "<li", "<h1", "<h2", "<h3", "<h4", "<h5", "<h6",
                "<span", "<table", "<tr", "<td", "<th", "<ul", "<ol", "<header", "<footer",
                "<nav", "<head", "<style", "<script", "<meta", "<title", "",
            ],
            Self::Solidity => &[
                "\npragma ",
                "\nusing ",
                "\ncontract ",
                "\ninterface ",
                "\nlibrary ",
                "\nconstructor ",
                "\ntype ",
                "\nfunction ",
                "\nevent ",
                "\nmodifier ",
                "\nerror ",
                "\nstruct ",
                "\nenum ",
                "\nif ",
                "\nfor ",
                "\nwhile ",
                "\ndo while ",
                "\nassembly ",
                "\n\n",
                "\n",
                " ",
                "",
            ],
            Self::Proto => &[
                "\nmessage ",
                "\nservice ",
                "\nenum ",
                "\noption ",
                "\nimport ",
                "\nsyntax ",
                "\n\n",
                "\n",
                " ",
                "",
            ],
        }
    }

    /// Grammar for the function-pair chunker. `None` when the language has
    /// no wired grammar or its feature is disabled.
    #[must_use]
    pub fn function_grammar(self) -> Option<FunctionGrammar> {
        match self {
            #[cfg(feature = "lang-python")]
            Self::Python => Some(FunctionGrammar {
                language: tree_sitter_python::LANGUAGE.into(),
                function_kinds: &["function_definition"],
                decorated_kind: Some("decorated_definition"),
            }),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}
