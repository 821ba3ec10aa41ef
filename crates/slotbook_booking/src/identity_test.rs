#[cfg(test)]
mod tests {
    use crate::identity::{
        DeviceIdentity, FileIdentityStore, FingerprintSource, HostFingerprint, IdentityError,
        IdentityProvider, IdentityStore, MemoryIdentityStore, MockFingerprintSource,
        RandomFingerprint,
    };
    use slotbook_common::{internal_error, SlotbookError};

    /// Store whose backing medium is gone.
    struct BrokenStore;

    impl IdentityStore for BrokenStore {
        fn read(&self) -> Result<Option<String>, SlotbookError> {
            Err(internal_error("storage unavailable"))
        }

        fn write(&self, _token: &str) -> Result<(), SlotbookError> {
            Err(internal_error("storage unavailable"))
        }
    }

    #[test]
    fn test_computes_once_then_reads_cache() {
        let mut source = MockFingerprintSource::new();
        source
            .expect_compute()
            .times(1)
            .returning(|| Ok("fp-123".to_string()));
        let provider = IdentityProvider::new(MemoryIdentityStore::new(), source);

        let first = provider.resolve().unwrap();
        let second = provider.resolve().unwrap();

        assert_eq!(first.as_str(), "fp-123");
        assert_eq!(first, second);
    }

    #[test]
    fn test_cached_token_skips_source() {
        let store = MemoryIdentityStore::new();
        store.write("cached-token").unwrap();
        let mut source = MockFingerprintSource::new();
        source.expect_compute().never();

        let provider = IdentityProvider::new(store, source);
        assert_eq!(provider.resolve().unwrap().as_str(), "cached-token");
    }

    #[test]
    fn test_broken_store_still_yields_identity() {
        let mut source = MockFingerprintSource::new();
        source
            .expect_compute()
            .times(2)
            .returning(|| Ok("fp-456".to_string()));
        let provider = IdentityProvider::new(BrokenStore, source);

        assert_eq!(provider.resolve().unwrap().as_str(), "fp-456");
        // Nothing was cached, so the source is asked again
        assert_eq!(provider.resolve().unwrap().as_str(), "fp-456");
    }

    #[test]
    fn test_source_failure_is_reported() {
        let mut source = MockFingerprintSource::new();
        source
            .expect_compute()
            .returning(|| Err(IdentityError::SourceFailed("no entropy".to_string())));
        let provider = IdentityProvider::new(MemoryIdentityStore::new(), source);

        assert!(matches!(
            provider.resolve(),
            Err(IdentityError::SourceFailed(_))
        ));
    }

    #[test]
    fn test_blank_token_is_rejected() {
        let mut source = MockFingerprintSource::new();
        source.expect_compute().returning(|| Ok("   ".to_string()));
        let provider = IdentityProvider::new(MemoryIdentityStore::new(), source);

        assert!(matches!(provider.resolve(), Err(IdentityError::EmptyToken)));
        assert!(DeviceIdentity::new("").is_none());
    }

    #[test]
    fn test_file_store_survives_new_provider() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("fingerprint");

        let first = IdentityProvider::new(FileIdentityStore::new(&path), RandomFingerprint)
            .resolve()
            .unwrap();
        let second = IdentityProvider::new(FileIdentityStore::new(&path), RandomFingerprint)
            .resolve()
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap().trim(),
            first.as_str()
        );
    }

    #[test]
    fn test_file_store_missing_file_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileIdentityStore::new(dir.path().join("absent"));
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_builtin_sources() {
        let host = HostFingerprint.compute().unwrap();
        assert_eq!(host, HostFingerprint.compute().unwrap());
        assert_eq!(host.len(), 32);

        let a = RandomFingerprint.compute().unwrap();
        let b = RandomFingerprint.compute().unwrap();
        assert_ne!(a, b);
    }
}
