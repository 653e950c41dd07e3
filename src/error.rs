use thiserror;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O error, from `std::io::Error`.
    #[error("i/o error: {0}")]
    IO(#[from] std::io::Error),
    /// A DIE lacks an attribute the host contract guarantees for its tag.
    #[error("{tag} has no {attr} attribute")]
    MissingAttribute {
        tag: gimli::DwTag,
        attr: gimli::DwAt,
    },
    /// More types than a BTF type id can address.
    #[error("too many BTF types: {0} (max 65535)")]
    TooManyTypes(usize),
    /// A string starts past the maximum name offset.
    #[error("string table offset {0} overflows the BTF name offset limit")]
    StringTableOverflow(usize),
    /// More trailing records than a type's vlen field can hold.
    #[error("{0} trailing records exceed the BTF vlen limit")]
    VlenOverflow(usize),
    /// Invalid string reference.
    #[error("no string at offset {0}")]
    InvalidString(u32),
}
