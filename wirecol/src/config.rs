use bon::Builder;

const DEFAULT_MAX_STRING_SIZE: usize = 1 << 30;
const DEFAULT_MAX_ARRAY_SIZE: usize = 1 << 30;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Builder)]
/// Limits applied to length prefixes read from untrusted input.
///
/// Loading data with a length above a limit fails the load rather than
/// allocating the requested amount of memory. Columns which read length
/// prefixes carry their own copy, the factory hands the same limits to
/// every nested column it creates.
pub struct LoadLimits {
    #[builder(default = DEFAULT_MAX_STRING_SIZE)]
    /// The maximum length in bytes of a single string value.
    ///
    /// Default is `1 GiB`.
    pub max_string_size: usize,
    #[builder(default = DEFAULT_MAX_ARRAY_SIZE)]
    /// The maximum number of elements of a single array, also applied to
    /// the number of keys in a dictionary.
    ///
    /// Default is `1 GiB` elements.
    pub max_array_size: usize,
}

impl Default for LoadLimits {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let limits = LoadLimits::default();
        assert_eq!(limits.max_string_size, 1 << 30);
        assert_eq!(limits.max_array_size, 1 << 30);

        let limits = LoadLimits::builder().max_string_size(16).build();
        assert_eq!(limits.max_string_size, 16);
        assert_eq!(limits.max_array_size, DEFAULT_MAX_ARRAY_SIZE);
    }
}
