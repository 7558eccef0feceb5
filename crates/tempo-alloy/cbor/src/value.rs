//! The JSON-like value model carried by the CBOR codec.

/// A CBOR data item.
///
/// Maps keep their entries in insertion order and are keyed by strings; integer keys read
/// from the wire (COSE style) are stringified on decode.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CborValue {
    /// The simple value `null` (`0xf6`).
    #[default]
    Null,
    /// The simple value `undefined` (`0xf7`).
    Undefined,
    /// `false` (`0xf4`) or `true` (`0xf5`).
    Bool(bool),
    /// An integer, encoded with major type 0 or 1.
    Integer(i64),
    /// A floating point number, encoded as float32 or float64.
    Float(f64),
    /// A UTF-8 text string (major type 3).
    Text(String),
    /// A byte string (major type 2).
    Bytes(Vec<u8>),
    /// An array of values (major type 4).
    Array(Vec<CborValue>),
    /// A string-keyed map of values (major type 5).
    Map(Vec<(String, CborValue)>),
}

impl CborValue {
    /// Returns `true` for [`CborValue::Null`].
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the boolean if this is a [`CborValue::Bool`].
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer if this is a [`CborValue::Integer`].
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the number as `f64` for both integers and floats.
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the string if this is a [`CborValue::Text`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the bytes if this is a [`CborValue::Bytes`].
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the items if this is a [`CborValue::Array`].
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries if this is a [`CborValue::Map`].
    pub fn as_map(&self) -> Option<&[(String, Self)]> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up `key` in a map. Returns `None` for non-map values.
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.as_map()?.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Inserts `value` under `key`, keeping the position of an existing entry.
    ///
    /// Does nothing for non-map values.
    pub fn insert(&mut self, key: impl Into<String>, value: Self) {
        if let Self::Map(entries) = self {
            let key = key.into();
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some((_, slot)) => *slot = value,
                None => entries.push((key, value)),
            }
        }
    }
}

impl From<bool> for CborValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for CborValue {
                fn from(value: $ty) -> Self {
                    Self::Integer(value.into())
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for CborValue {
    fn from(value: f32) -> Self {
        Self::Float(value.into())
    }
}

impl From<f64> for CborValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for CborValue {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl From<String> for CborValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for CborValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for CborValue {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl From<Vec<Self>> for CborValue {
    fn from(value: Vec<Self>) -> Self {
        Self::Array(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for CborValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl FromIterator<(String, Self)> for CborValue {
    fn from_iter<I: IntoIterator<Item = (String, Self)>>(iter: I) -> Self {
        let mut map = Self::Map(Vec::new());
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}
