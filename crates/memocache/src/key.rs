//! Cache key resolution
//!
//! A key is the function identity followed by one part per argument, joined
//! by `:`. Keyword parts ([`Named`]) always come after the positional parts
//! and are dropped when the cache ignores keyword arguments:
//!
//! ```text
//! settings::fetch_config:1234:"dark":limit=10
//! └──── identity ──────┘ └ positional ┘ └ keyword ┘
//! ```
//!
//! Arguments opt in through [`KeyPart`]. Types that have no stable value
//! representation can still be passed as [`TypeOnly`], which keys them by
//! their type name instead of their contents.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

/// Separator between key parts
pub const DELIMITER: char = ':';

/// Separator between a keyword argument's name and value
pub const KEYWORD_MARK: char = '=';

/// Build the identity of a function from the calling module's path
///
/// ```
/// let name = memocache::fn_name!(fetch_config);
/// assert!(name.ends_with("::fetch_config"));
/// ```
#[macro_export]
macro_rules! fn_name {
    ($name:ident) => {
        concat!(module_path!(), "::", stringify!($name))
    };
}

/// Collects the parts of one call's key
#[derive(Debug, Default)]
pub struct KeyBuilder {
    positional: Vec<String>,
    keyword: Vec<String>,
}

impl KeyBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument's representation
    pub fn positional(&mut self, repr: String) {
        self.positional.push(repr);
    }

    /// Append a keyword argument's name and representation
    pub fn keyword(&mut self, name: &str, repr: String) {
        self.keyword.push(format!("{}{}{}", name, KEYWORD_MARK, repr));
    }

    /// Whether no argument was written at all, keyword or not
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Join the collected parts behind `name`
    pub fn finish(self, name: &str, ignore_kwargs: bool) -> String {
        let mut key = String::from(name);
        let keyword: &[String] = if ignore_kwargs { &[] } else { &self.keyword };
        for part in self.positional.iter().chain(keyword) {
            key.push(DELIMITER);
            key.push_str(part);
        }
        key
    }
}

/// A single argument that can take part in a cache key
///
/// `cache_repr` must be deterministic for equal values and should differ for
/// values that make the wrapped function return different results.
pub trait KeyPart {
    /// Canonical textual representation of this value
    fn cache_repr(&self) -> String;

    /// Write this argument into `key`; positional unless overridden
    fn write_key(&self, key: &mut KeyBuilder) {
        key.positional(self.cache_repr());
    }
}

/// A full argument list
pub trait CacheArgs {
    /// Write every argument into `key`, in call order
    fn write_key(&self, key: &mut KeyBuilder);
}

/// Resolve the key for calling `name` with `args`
pub fn resolve_key<A>(name: &str, args: &A, ignore_kwargs: bool) -> String
where
    A: CacheArgs + ?Sized,
{
    let mut key = KeyBuilder::new();
    args.write_key(&mut key);
    key.finish(name, ignore_kwargs)
}

/// Whether `args` writes no parts at all
pub(crate) fn is_bare<A>(args: &A) -> bool
where
    A: CacheArgs + ?Sized,
{
    let mut key = KeyBuilder::new();
    args.write_key(&mut key);
    key.is_empty()
}

macro_rules! display_key_part {
    ($($ty:ty),* $(,)?) => {
        $(
            impl KeyPart for $ty {
                fn cache_repr(&self) -> String {
                    self.to_string()
                }
            }

            impl CacheArgs for $ty {
                fn write_key(&self, key: &mut KeyBuilder) {
                    KeyPart::write_key(self, key);
                }
            }
        )*
    };
}

macro_rules! debug_key_part {
    ($($ty:ty),* $(,)?) => {
        $(
            impl KeyPart for $ty {
                fn cache_repr(&self) -> String {
                    format!("{:?}", self)
                }
            }

            impl CacheArgs for $ty {
                fn write_key(&self, key: &mut KeyBuilder) {
                    KeyPart::write_key(self, key);
                }
            }
        )*
    };
}

display_key_part!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, bool,
);

// Floats and text use Debug so `1.0` keeps its fraction and `"1"` stays
// distinct from `1`.
debug_key_part!(f32, f64, char, str, String);

impl<T: KeyPart + ?Sized> KeyPart for &T {
    fn cache_repr(&self) -> String {
        (**self).cache_repr()
    }

    fn write_key(&self, key: &mut KeyBuilder) {
        KeyPart::write_key(&**self, key);
    }
}

impl<T: KeyPart + ?Sized> CacheArgs for &T {
    fn write_key(&self, key: &mut KeyBuilder) {
        KeyPart::write_key(*self, key);
    }
}

impl<T: KeyPart + ?Sized> KeyPart for Box<T> {
    fn cache_repr(&self) -> String {
        (**self).cache_repr()
    }

    fn write_key(&self, key: &mut KeyBuilder) {
        KeyPart::write_key(&**self, key);
    }
}

impl<T: KeyPart + ?Sized> KeyPart for Arc<T> {
    fn cache_repr(&self) -> String {
        (**self).cache_repr()
    }

    fn write_key(&self, key: &mut KeyBuilder) {
        KeyPart::write_key(&**self, key);
    }
}

impl<T: KeyPart + ?Sized> KeyPart for Rc<T> {
    fn cache_repr(&self) -> String {
        (**self).cache_repr()
    }

    fn write_key(&self, key: &mut KeyBuilder) {
        KeyPart::write_key(&**self, key);
    }
}

impl<T: KeyPart> KeyPart for Option<T> {
    fn cache_repr(&self) -> String {
        match self {
            Some(value) => format!("Some({})", value.cache_repr()),
            None => "None".to_string(),
        }
    }
}

impl<T: KeyPart> CacheArgs for Option<T> {
    fn write_key(&self, key: &mut KeyBuilder) {
        KeyPart::write_key(self, key);
    }
}

/// A keyword argument: `Named("limit", 10)` keys as `limit=10`
///
/// Built-in positional parts never render as a bare `name=value` (text is
/// quoted), so a keyword never shares a key with a positional argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Named<T>(pub &'static str, pub T);

impl<T: KeyPart> KeyPart for Named<T> {
    fn cache_repr(&self) -> String {
        format!("{}{}{}", self.0, KEYWORD_MARK, self.1.cache_repr())
    }

    fn write_key(&self, key: &mut KeyBuilder) {
        key.keyword(self.0, self.1.cache_repr());
    }
}

impl<T: KeyPart> CacheArgs for Named<T> {
    fn write_key(&self, key: &mut KeyBuilder) {
        KeyPart::write_key(self, key);
    }
}

/// An argument keyed by its type name rather than its value
///
/// Useful for receivers and handles (connection pools, services) that are
/// shared by every call and have no meaningful textual form.
pub struct TypeOnly<T: ?Sized>(PhantomData<fn() -> Box<T>>);

impl<T: ?Sized> TypeOnly<T> {
    /// Marker for `T`
    pub fn new() -> Self {
        Self(PhantomData)
    }

    /// Marker for the type of `value`
    pub fn of(_value: &T) -> Self {
        Self(PhantomData)
    }
}

impl<T: ?Sized> Default for TypeOnly<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for TypeOnly<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for TypeOnly<T> {}

impl<T: ?Sized> fmt::Debug for TypeOnly<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeOnly<{}>", type_name::<T>())
    }
}

impl<T: ?Sized> KeyPart for TypeOnly<T> {
    fn cache_repr(&self) -> String {
        format!("<{}>", type_name::<T>())
    }
}

impl<T: ?Sized> CacheArgs for TypeOnly<T> {
    fn write_key(&self, key: &mut KeyBuilder) {
        KeyPart::write_key(self, key);
    }
}

impl CacheArgs for () {
    fn write_key(&self, _key: &mut KeyBuilder) {}
}

macro_rules! tuple_args {
    ($($name:ident)+) => {
        impl<$($name: KeyPart),+> CacheArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn write_key(&self, key: &mut KeyBuilder) {
                let ($($name,)+) = self;
                $( KeyPart::write_key($name, key); )+
            }
        }
    };
}

tuple_args!(A);
tuple_args!(A B);
tuple_args!(A B C);
tuple_args!(A B C D);
tuple_args!(A B C D E);
tuple_args!(A B C D E F);
tuple_args!(A B C D E F G);
tuple_args!(A B C D E F G H);

#[cfg(test)]
mod tests {
    use super::*;

    struct Pool;

    #[test]
    fn test_primitive_keys() {
        assert_eq!(resolve_key("mod.fn", &1u64, false), "mod.fn:1");
        assert_eq!(resolve_key("mod.fn", &(1u64, -2i32), false), "mod.fn:1:-2");
        assert_eq!(resolve_key("mod.fn", &("ex", 2u8), false), "mod.fn:\"ex\":2");
        assert_eq!(resolve_key("mod.fn", &1.0f64, false), "mod.fn:1.0");
        assert_eq!(resolve_key("mod.fn", &(), false), "mod.fn");
    }

    #[test]
    fn test_text_and_numbers_do_not_collide() {
        assert_ne!(
            resolve_key("mod.fn", &1u32, false),
            resolve_key("mod.fn", &"1", false)
        );
        assert_ne!(
            resolve_key("mod.fn", &Some(1u32), false),
            resolve_key("mod.fn", &None::<u32>, false)
        );
    }

    #[test]
    fn test_deterministic() {
        let args = (String::from("alice"), 7u64, Named("limit", 10u32));
        assert_eq!(
            resolve_key("mod.fn", &args, false),
            resolve_key("mod.fn", &args, false)
        );
    }

    #[test]
    fn test_keywords_follow_positionals() {
        let args = (Named("limit", 10u32), 5u64, Named("page", 2u32));
        assert_eq!(
            resolve_key("mod.fn", &args, false),
            "mod.fn:5:limit=10:page=2"
        );
        assert_eq!(resolve_key("mod.fn", &args, true), "mod.fn:5");
    }

    #[test]
    fn test_keyword_differs_from_positional_pair() {
        let keyword = resolve_key("mod.fn", &Named("limit", 10u32), false);
        let positional = resolve_key("mod.fn", &("limit", 10u32), false);

        assert_eq!(keyword, "mod.fn:limit=10");
        assert_eq!(positional, "mod.fn:\"limit\":10");
        assert_ne!(keyword, positional);
        assert_ne!(resolve_key("mod.fn", &"limit=10", false), keyword);
    }

    #[test]
    fn test_type_only() {
        let pool = Pool;
        let key = resolve_key("mod.fn", &(TypeOnly::of(&pool), 3u64), false);
        assert!(key.starts_with("mod.fn:<"));
        assert!(key.contains("Pool>"));
        assert!(key.ends_with(":3"));
        assert_eq!(
            key,
            resolve_key("mod.fn", &(TypeOnly::<Pool>::new(), 3u64), false)
        );
    }

    #[test]
    fn test_bare_args() {
        assert!(is_bare(&()));
        assert!(!is_bare(&(Named("limit", 1u8),)));
        assert!(!is_bare(&0u8));
    }

    #[test]
    fn test_fn_name() {
        assert_eq!(fn_name!(lookup), concat!(module_path!(), "::lookup"));
    }
}
