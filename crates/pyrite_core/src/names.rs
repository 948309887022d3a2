//! Name interning.
//!
//! The binder compares names constantly: every bind site, every implicit
//! dunder seed, every decorator and keyword-argument check. Names are
//! therefore interned once in a shared table and compared as integer
//! handles. The table pre-seeds the names the analysis passes recognize
//! structurally (`metaclass`, `staticmethod`, `sys`, `version_info`, ...)
//! so those hot-path checks never touch string data.

use lasso::{Spur, ThreadedRodeo};
use std::fmt;
use std::sync::Arc;

/// Handle to an interned name. Two handles from the same table are equal
/// exactly when their text is equal, so comparison is an integer compare.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Name(Spur);

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.0)
    }
}

/// Pre-interned handles for the names the analysis passes test against
/// structurally: the decorators that change how a method binds members,
/// the `metaclass` class argument, the implicit `object` base, and the
/// `sys` / `os` / `typing` attributes the static evaluator understands.
#[derive(Debug, Clone, Copy)]
pub struct KnownNames {
    pub metaclass: Name,
    pub staticmethod: Name,
    pub classmethod: Name,
    pub dunder_new: Name,
    pub object: Name,
    pub any: Name,
    pub typing: Name,
    pub type_checking: Name,
    pub sys: Name,
    pub os: Name,
    pub version_info: Name,
    pub platform: Name,
    pub os_name: Name,
    pub startswith: Name,
}

impl KnownNames {
    fn seed(rodeo: &ThreadedRodeo) -> Self {
        let name = |text: &'static str| Name(rodeo.get_or_intern_static(text));
        Self {
            metaclass: name("metaclass"),
            staticmethod: name("staticmethod"),
            classmethod: name("classmethod"),
            dunder_new: name("__new__"),
            object: name("object"),
            any: name("Any"),
            typing: name("typing"),
            type_checking: name("TYPE_CHECKING"),
            sys: name("sys"),
            os: name("os"),
            version_info: name("version_info"),
            platform: name("platform"),
            os_name: name("name"),
            startswith: name("startswith"),
        }
    }
}

/// Shared, thread-safe table of interned names. One table serves a whole
/// analysis session; clones share the same storage, so handles unify
/// across every file bound against the table.
#[derive(Clone)]
pub struct NameTable {
    rodeo: Arc<ThreadedRodeo>,
    known: KnownNames,
}

impl NameTable {
    pub fn new() -> Self {
        let rodeo = Arc::new(ThreadedRodeo::new());
        let known = KnownNames::seed(&rodeo);
        Self { rodeo, known }
    }

    /// Intern `text`, returning its handle; repeated interning of the
    /// same text returns the same handle.
    #[inline]
    pub fn intern(&self, text: &str) -> Name {
        Name(self.rodeo.get_or_intern(text))
    }

    /// Intern a string with static storage without copying it.
    #[inline]
    pub fn intern_static(&self, text: &'static str) -> Name {
        Name(self.rodeo.get_or_intern_static(text))
    }

    /// Find the handle for `text` if it has been interned, without
    /// interning it.
    #[inline]
    pub fn lookup(&self, text: &str) -> Option<Name> {
        self.rodeo.get(text).map(Name)
    }

    /// The text behind a handle.
    #[inline]
    pub fn text(&self, name: Name) -> &str {
        self.rodeo.resolve(&name.0)
    }

    /// The pre-seeded structurally-recognized names.
    #[inline]
    pub fn known(&self) -> &KnownNames {
        &self.known
    }
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NameTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameTable")
            .field("names", &self.rodeo.len())
            .finish()
    }
}
