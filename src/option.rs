//! Compile options select the protoc plugins ("flavors") to run.
//!
//! A [`CompileOption`] is a bit-set. Every atomic flavor owns exactly one bit,
//! named unions such as [`CompileOption::PYTHON`] combine several of them. Only
//! atomic options map to a plugin, so unions have to be split with
//! [`CompileOption::atomic_components`] before invoking protoc.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::path::Path;
use std::str::FromStr;

use crate::Error;

/// A set of compilation flavors.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CompileOption(u16);

/// Static description of an atomic flavor.
struct Flavor {
    option: CompileOption,
    name: &'static str,
    token: Option<&'static str>,
    plugin: &'static str,
    label: &'static str,
    default_kwargs: &'static [(&'static str, &'static str)],
    default_args: &'static [&'static str],
}

static FLAVORS: [Flavor; 9] = [
    Flavor {
        option: CompileOption::JAVA,
        name: "JAVA",
        token: Some("java"),
        plugin: "java",
        label: "java",
        default_kwargs: &[],
        default_args: &[],
    },
    Flavor {
        option: CompileOption::JS_LIBRARY,
        name: "JS_LIBRARY",
        token: None,
        plugin: "js",
        label: "javascript as library",
        default_kwargs: &[("library", "protobuf_library")],
        default_args: &["binary"],
    },
    Flavor {
        option: CompileOption::JS_INDIVIDUAL,
        name: "JS_INDIVIDUAL",
        token: None,
        plugin: "js",
        label: "javascript individual",
        default_kwargs: &[("import_style", "commonjs")],
        default_args: &["binary"],
    },
    Flavor {
        option: CompileOption::CSHARP,
        name: "CSHARP",
        token: Some("cs"),
        plugin: "csharp",
        label: "csharp",
        default_kwargs: &[],
        default_args: &[],
    },
    Flavor {
        option: CompileOption::CPP,
        name: "CPP",
        token: Some("cpp"),
        plugin: "cpp",
        label: "cpp",
        default_kwargs: &[],
        default_args: &[],
    },
    Flavor {
        option: CompileOption::PYTHON_BETTER_PROTO,
        name: "PYTHON_BETTER_PROTO",
        token: Some("better"),
        plugin: "python_betterproto",
        label: "python with `better_proto` plugin",
        default_kwargs: &[],
        default_args: &[],
    },
    Flavor {
        option: CompileOption::PYTHON_MYPY,
        name: "PYTHON_MYPY",
        token: Some("mypy"),
        plugin: "mypy",
        label: "mypy python stubs",
        default_kwargs: &[],
        default_args: &[],
    },
    Flavor {
        option: CompileOption::PYTHON_PROTOPLUS,
        name: "PYTHON_PROTOPLUS",
        token: Some("plus"),
        plugin: "proto-plus",
        label: "python with `proto-plus` plugin",
        default_kwargs: &[],
        default_args: &[],
    },
    Flavor {
        option: CompileOption::PYTHON_BASIC,
        name: "PYTHON_BASIC",
        token: Some("py"),
        plugin: "python",
        label: "python",
        default_kwargs: &[],
        default_args: &[],
    },
];

/// Named unions, in addition to the atomic flavors.
static UNIONS: [(CompileOption, &str); 3] = [
    (CompileOption::JAVASCRIPT, "JAVASCRIPT"),
    (CompileOption::PYTHON, "PYTHON"),
    (CompileOption::ALL, "ALL"),
];

impl CompileOption {
    /// No flavor at all.
    pub const NONE: Self = Self(0);
    pub const JAVA: Self = Self(1 << 0);
    pub const JS_LIBRARY: Self = Self(1 << 1);
    pub const JS_INDIVIDUAL: Self = Self(1 << 2);
    pub const CSHARP: Self = Self(1 << 3);
    pub const CPP: Self = Self(1 << 4);
    pub const PYTHON_BETTER_PROTO: Self = Self(1 << 5);
    pub const PYTHON_MYPY: Self = Self(1 << 6);
    pub const PYTHON_PROTOPLUS: Self = Self(1 << 7);
    pub const PYTHON_BASIC: Self = Self(1 << 8);

    /// Both javascript flavors.
    pub const JAVASCRIPT: Self = Self(Self::JS_INDIVIDUAL.0 | Self::JS_LIBRARY.0);
    /// Every python flavor.
    pub const PYTHON: Self = Self(
        Self::PYTHON_MYPY.0
            | Self::PYTHON_BETTER_PROTO.0
            | Self::PYTHON_PROTOPLUS.0
            | Self::PYTHON_BASIC.0,
    );
    /// Every flavor.
    pub const ALL: Self = Self(
        Self::JAVA.0 | Self::JAVASCRIPT.0 | Self::CSHARP.0 | Self::CPP.0 | Self::PYTHON.0,
    );

    /// Raw bit representation.
    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every flavor of `other` is also in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// An atomic option has exactly one bit set.
    pub const fn is_atomic(self) -> bool {
        self.0 != 0 && self.0 & (self.0 - 1) == 0
    }

    /// A composite option has more than one bit set.
    pub const fn is_composite(self) -> bool {
        self.0 != 0 && self.0 & (self.0 - 1) != 0
    }

    /// Every named option, atomic flavors first.
    pub fn named() -> impl Iterator<Item = CompileOption> {
        FLAVORS
            .iter()
            .map(|flavor| flavor.option)
            .chain(UNIONS.iter().map(|(option, _)| *option))
    }

    /// Parse a single CLI token, e.g. `"py"` or `"all"`.
    pub fn from_token(token: &str) -> Result<Self, Error> {
        Self::named()
            .filter(|option| option.tokens().iter().any(|t| *t == token))
            .reduce(|acc, option| acc & option)
            .filter(|option| !option.is_empty())
            .ok_or_else(|| Error::InvalidOption(token.to_string()))
    }

    /// Parse several tokens into the union of the options they name.
    pub fn from_tokens<I, S>(tokens: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tokens
            .into_iter()
            .try_fold(Self::NONE, |acc, token| Ok(acc | Self::from_token(token.as_ref())?))
    }

    /// Tokens that select this option on the command line.
    pub fn tokens(self) -> Vec<&'static str> {
        // These unions answer to their own token only.
        if self == Self::ALL {
            return vec!["all"];
        }
        if self == Self::JAVASCRIPT {
            return vec!["js"];
        }

        FLAVORS
            .iter()
            .filter(|flavor| self.intersects(flavor.option))
            .filter_map(|flavor| flavor.token)
            .collect()
    }

    /// Every atomic flavor contained in this set.
    pub fn atomic_components(self) -> Vec<CompileOption> {
        FLAVORS
            .iter()
            .map(|flavor| flavor.option)
            .filter(|option| self.contains(*option))
            .collect()
    }

    /// Constant name of a named option.
    pub fn name(self) -> Option<&'static str> {
        self.flavor().map(|flavor| flavor.name).or_else(|| {
            UNIONS
                .iter()
                .find(|(option, _)| *option == self)
                .map(|(_, name)| *name)
        })
    }

    /// Name of the protoc plugin, the `<name>` in `--<name>_out`.
    pub fn plugin_name(self) -> Result<&'static str, Error> {
        self.flavor()
            .map(|flavor| flavor.plugin)
            .ok_or(Error::UnsupportedOption(self))
    }

    /// Parameter string for the plugin of an atomic option.
    ///
    /// The flavor's default parameters are merged into `args` and `kwargs`,
    /// defaults win over caller keys of the same name. The result renders
    /// `key=value` pairs first, then bare flags, both sorted.
    pub fn plugin_parameters(
        self,
        args: &BTreeSet<String>,
        kwargs: &BTreeMap<String, String>,
    ) -> Result<String, Error> {
        if self.is_composite() {
            return Err(Error::CompositeNotAllowed(self));
        }
        let flavor = self.flavor().ok_or(Error::UnsupportedOption(self))?;

        let mut args = args.clone();
        let mut kwargs = kwargs.clone();
        for (key, value) in flavor.default_kwargs {
            kwargs.insert(key.to_string(), value.to_string());
        }
        for arg in flavor.default_args {
            args.insert(arg.to_string());
        }

        let params = kwargs
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .chain(args)
            .collect::<Vec<_>>();
        Ok(params.join(","))
    }

    /// Value of the `--<plugin>_out` flag: `params:output`, or `output` alone
    /// when there are no parameters.
    pub fn format_out(
        self,
        output: &Path,
        args: &BTreeSet<String>,
        kwargs: &BTreeMap<String, String>,
    ) -> Result<String, Error> {
        let params = self.plugin_parameters(args, kwargs)?;
        if params.is_empty() {
            Ok(output.display().to_string())
        } else {
            Ok(format!("{params}:{}", output.display()))
        }
    }

    /// `"[token] label"` for options selected by exactly one token.
    pub fn describe(self) -> Option<String> {
        match self.tokens().as_slice() {
            [token] => Some(format!("[{token}] {self}")),
            _ => None,
        }
    }

    /// Descriptions of every option that can be requested on the command line.
    pub fn catalog() -> Vec<String> {
        Self::named().filter_map(Self::describe).collect()
    }

    fn flavor(self) -> Option<&'static Flavor> {
        FLAVORS.iter().find(|flavor| flavor.option == self)
    }
}

impl BitOr for CompileOption {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CompileOption {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for CompileOption {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl FromStr for CompileOption {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s)
    }
}

impl fmt::Display for CompileOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let components = self.atomic_components();
        match components.as_slice() {
            [] => write!(f, "none"),
            [atomic] => match atomic.flavor() {
                Some(flavor) => write!(f, "{}", flavor.label),
                None => write!(f, "{:#x}", self.0),
            },
            _ => {
                let labels = components
                    .iter()
                    .map(|option| option.to_string())
                    .collect::<Vec<_>>();
                write!(f, "{}", labels.join(" | "))
            }
        }
    }
}

impl fmt::Debug for CompileOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self
            .atomic_components()
            .iter()
            .filter_map(|option| option.name())
            .collect::<Vec<_>>();
        write!(f, "CompileOption({})", names.join(" | "))
    }
}
