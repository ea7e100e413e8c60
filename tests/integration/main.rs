//! Integration tests for tokencache

mod cache_tests {
    use chrono::{Duration as ChronoDuration, Utc};
    use serial_test::serial;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;
    use tokencache::lock::{FileLocker, FlockLocker};
    use tokencache::{CachedToken, FileTokenCache, RetryPolicy, TokenCache, TokenCacheError};

    fn token(access: &str) -> CachedToken {
        CachedToken::new(access, Utc::now() + ChronoDuration::hours(1))
            .with_refresh_token(format!("{}-refresh", access))
    }

    fn cache_file(temp: &TempDir) -> PathBuf {
        temp.path().join("cache.tok")
    }

    #[test]
    fn absent_write_read_corrupt_scenario() {
        let temp = TempDir::new().unwrap();
        let path = cache_file(&temp);
        let cache = FileTokenCache::new();

        assert!(cache.read(&path).unwrap().is_zero());

        let written = token("abc");
        cache.write(&path, &written).unwrap();
        assert_eq!(cache.read(&path).unwrap(), written);

        fs::write(&path, b"\xde\xad\xbe").unwrap();
        let err = cache.read(&path).unwrap_err();
        assert!(matches!(err, TokenCacheError::Decode { .. }));
    }

    #[test]
    fn empty_file_is_decode_error() {
        let temp = TempDir::new().unwrap();
        let path = cache_file(&temp);
        fs::write(&path, b"").unwrap();

        assert!(matches!(
            FileTokenCache::new().read(&path),
            Err(TokenCacheError::Decode { .. })
        ));
    }

    #[test]
    fn read_in_missing_directory_is_absent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("not-yet").join("cache.tok");

        assert!(FileTokenCache::new().read(&path).unwrap().is_zero());
        assert!(!path.parent().unwrap().exists());
    }

    #[test]
    fn write_in_missing_directory_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("not-yet").join("cache.tok");
        let cache = FileTokenCache::new()
            .with_retry(RetryPolicy::new(Duration::from_secs(5), Duration::from_millis(100)));

        let start = Instant::now();
        let err = cache.write(&path, &token("abc")).unwrap_err();

        assert!(matches!(err, TokenCacheError::Lock { .. }));
        // A missing directory is not contention, so no retries
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[cfg(unix)]
    #[test]
    fn written_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = cache_file(&temp);
        FileTokenCache::new().write(&path, &token("abc")).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o700);
    }

    #[test]
    fn overwrite_replaces_token() {
        let temp = TempDir::new().unwrap();
        let path = cache_file(&temp);
        let cache = FileTokenCache::new();

        cache.write(&path, &token("first")).unwrap();
        cache.write(&path, &token("second")).unwrap();

        assert_eq!(cache.read(&path).unwrap().access_token, "second");
    }

    #[test]
    #[serial]
    fn concurrent_writers_leave_one_complete_token() {
        let temp = TempDir::new().unwrap();
        let path = Arc::new(cache_file(&temp));
        let writers = 8;
        let barrier = Arc::new(Barrier::new(writers));

        let handles: Vec<_> = (0..writers)
            .map(|i| {
                let path = Arc::clone(&path);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let cache = FileTokenCache::new().with_retry(RetryPolicy::new(
                        Duration::from_secs(10),
                        Duration::from_millis(5),
                    ));
                    let written = token(&format!("writer-{}", i));
                    barrier.wait();
                    cache.write(&path, &written).unwrap();
                    written
                })
            })
            .collect();

        let written: Vec<CachedToken> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let stored = FileTokenCache::new().read(&path).unwrap();

        assert!(written.contains(&stored));
    }

    #[test]
    fn concurrent_readers_agree() {
        let temp = TempDir::new().unwrap();
        let path = Arc::new(cache_file(&temp));
        let expected = token("shared");
        FileTokenCache::new().write(&path, &expected).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let path = Arc::clone(&path);
                thread::spawn(move || FileTokenCache::new().read(&path).unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }

    #[test]
    #[serial]
    fn readers_never_see_partial_writes() {
        let temp = TempDir::new().unwrap();
        let path = Arc::new(cache_file(&temp));
        let tokens: Arc<Vec<CachedToken>> =
            Arc::new((0..4).map(|i| token(&format!("value-{}", i))).collect());
        FileTokenCache::new().write(&path, &tokens[0]).unwrap();

        let writer = {
            let path = Arc::clone(&path);
            let tokens = Arc::clone(&tokens);
            thread::spawn(move || {
                let cache = FileTokenCache::new().with_retry(RetryPolicy::new(
                    Duration::from_secs(10),
                    Duration::from_millis(1),
                ));
                for round in 0..40 {
                    cache.write(&path, &tokens[round % tokens.len()]).unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let path = Arc::clone(&path);
                let tokens = Arc::clone(&tokens);
                thread::spawn(move || {
                    let cache = FileTokenCache::new();
                    for _ in 0..40 {
                        let seen = cache.read(&path).unwrap();
                        assert!(tokens.contains(&seen));
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[test]
    #[serial]
    fn write_gives_up_within_budget() {
        let temp = TempDir::new().unwrap();
        let path = cache_file(&temp);
        let _holder = FlockLocker.try_lock_exclusive(&path).unwrap();

        let start = Instant::now();
        let err = FileTokenCache::new().write(&path, &token("abc")).unwrap_err();
        let elapsed = start.elapsed();

        assert!(matches!(err, TokenCacheError::Lock { .. }));
        assert!(elapsed >= Duration::from_millis(500));
        assert!(elapsed < Duration::from_secs(3));
        assert!(!path.exists());
    }

    #[test]
    #[serial]
    fn writer_waits_out_reader() {
        let temp = TempDir::new().unwrap();
        let path = cache_file(&temp);
        let reader = FlockLocker.lock_shared(&path).unwrap();

        let release = thread::spawn(move || {
            thread::sleep(Duration::from_millis(150));
            drop(reader);
        });

        FileTokenCache::new().write(&path, &token("abc")).unwrap();
        release.join().unwrap();

        assert_eq!(FileTokenCache::new().read(&path).unwrap().access_token, "abc");
    }
}

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    fn tokencache(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("tokencache");
        cmd.env("TOKENCACHE_CONFIG", temp.path().join("config.toml"));
        cmd
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        tokencache(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("authentication tokens"));
    }

    #[test]
    fn read_missing_cache() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("token.json");

        tokencache(&temp)
            .args(["read", "--path"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached token"));
    }

    #[test]
    fn write_then_read_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("token.json");

        tokencache(&temp)
            .args(["write", "--access-token", "abc", "--resource", "api://x", "--path"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("Cached token"));

        tokencache(&temp)
            .args(["read", "--json", "--path"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("\"access_token\": \"abc\""))
            .stdout(predicate::str::contains("api://x"));

        tokencache(&temp)
            .args(["read", "--path"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("valid until"));
    }

    #[test]
    fn write_from_stdin() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("token.json");

        tokencache(&temp)
            .args(["write", "--stdin", "--path"])
            .arg(&path)
            .write_stdin(r#"{"access_token":"from-stdin","expires_on":"2000-01-01T00:00:00Z"}"#)
            .assert()
            .success();

        tokencache(&temp)
            .args(["read", "--path"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("expired"));
    }

    #[test]
    fn read_corrupt_cache_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("token.json");
        fs::write(&path, "not json").unwrap();

        tokencache(&temp)
            .args(["read", "--path"])
            .arg(&path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to decode token cache"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn cache_path_from_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("configured.json");
        fs::write(
            temp.path().join("config.toml"),
            format!("[cache]\npath = {:?}\n", path.display().to_string()),
        )
        .unwrap();

        tokencache(&temp)
            .args(["write", "--access-token", "abc"])
            .assert()
            .success();

        assert!(path.exists());
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        tokencache(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        tokencache(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[retry]"));
    }

    #[test]
    fn config_init_writes_file() {
        let temp = TempDir::new().unwrap();
        tokencache(&temp)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration initialized"));

        assert!(temp.path().join("config.toml").exists());
    }
}
