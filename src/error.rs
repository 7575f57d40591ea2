use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("unknown sort option `{0}`")]
    UnknownSortOption(String),
    #[error("unknown group type `{0}` (expected all, studio, anchor, flex or other)")]
    UnknownGroupType(String),
    #[error("unknown group kind `{0}` (expected region or class)")]
    UnknownGroupKind(String),
    #[error("unknown sort surface `{0}` (expected standard or extended)")]
    UnknownSortSurface(String),
    #[error("sort option `{option}` is not offered by the {surface} sort menu")]
    SortNotOffered { option: String, surface: String },
}
