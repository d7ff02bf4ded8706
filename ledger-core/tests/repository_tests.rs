//! Repository contract tests
//!
//! Every check runs against the DuckDB adapter (file-backed via tempfile and
//! in-memory) and the in-memory map adapter, so the adapters stay
//! interchangeable.
//!
//! Run with: cargo test --test repository_tests -- --nocapture

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use ledger_core::adapters::{DuckDbRepository, MemoryRepository};
use ledger_core::ports::Repository;
use ledger_core::{Account, Error, OverdraftPolicy};

// ============================================================================
// Test Helpers
// ============================================================================

/// One repository of each flavour, schema initialized
fn repositories(policy: OverdraftPolicy) -> (TempDir, Vec<(&'static str, Arc<dyn Repository>)>) {
    let temp_dir = TempDir::new().unwrap();
    let file_repo = DuckDbRepository::new(&temp_dir.path().join("test.duckdb"), policy)
        .expect("Failed to create repository");
    let mem_db = DuckDbRepository::open_in_memory(policy).unwrap();
    let map = MemoryRepository::new(policy);

    let repos: Vec<(&'static str, Arc<dyn Repository>)> = vec![
        ("duckdb-file", Arc::new(file_repo)),
        ("duckdb-memory", Arc::new(mem_db)),
        ("map", Arc::new(map)),
    ];
    for (_, repo) in &repos {
        repo.ensure_schema().expect("Failed to initialize schema");
    }
    (temp_dir, repos)
}

fn create(repo: &dyn Repository, email: &str, balance: i64) -> Account {
    let mut account = Account::open(email, None).unwrap();
    account.balance = balance;
    repo.create_account(&mut account).unwrap();
    account
}

// ============================================================================
// Create / Get / List / Delete
// ============================================================================

#[test]
fn test_create_then_get_returns_matching_fields() {
    let (_dir, repos) = repositories(OverdraftPolicy::Deny);
    for (name, repo) in repos {
        let created = create(repo.as_ref(), "a@x.com", 0);
        assert!(created.id > 0, "{}: id should be assigned", name);

        let fetched = repo.get_account(created.id).unwrap();
        assert_eq!(fetched, created, "{}", name);
        assert_eq!(fetched.balance, 0, "{}", name);
    }
}

#[test]
fn test_get_unknown_id_is_not_found() {
    let (_dir, repos) = repositories(OverdraftPolicy::Deny);
    for (name, repo) in repos {
        assert!(
            matches!(repo.get_account(42), Err(Error::NotFound(_))),
            "{}",
            name
        );
    }
}

#[test]
fn test_delete_then_get_is_not_found() {
    let (_dir, repos) = repositories(OverdraftPolicy::Deny);
    for (name, repo) in repos {
        let account = create(repo.as_ref(), "a@x.com", 0);
        repo.delete_account(account.id).unwrap();

        assert!(matches!(repo.get_account(account.id), Err(Error::NotFound(_))), "{}", name);
        assert!(
            matches!(repo.delete_account(account.id), Err(Error::NotFound(_))),
            "{}: second delete should report not found",
            name
        );
    }
}

#[test]
fn test_list_count_tracks_creates_and_deletes() {
    let (_dir, repos) = repositories(OverdraftPolicy::Deny);
    for (name, repo) in repos {
        let mut live = Vec::new();
        let mut expected = 0usize;

        for i in 0..6 {
            live.push(create(repo.as_ref(), &format!("user{}@x.com", i), 0).id);
            expected += 1;
            if i % 2 == 1 {
                let id = live.remove(0);
                repo.delete_account(id).unwrap();
                expected -= 1;
            }
            assert_eq!(repo.get_accounts().unwrap().len(), expected, "{}", name);
        }
    }
}

#[test]
fn test_list_is_ordered_by_id() {
    let (_dir, repos) = repositories(OverdraftPolicy::Deny);
    for (name, repo) in repos {
        for i in 0..5 {
            create(repo.as_ref(), &format!("user{}@x.com", i), 0);
        }
        let ids: Vec<i64> = repo.get_accounts().unwrap().iter().map(|a| a.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted, "{}", name);
    }
}

#[test]
fn test_get_by_email_returns_first_match() {
    let (_dir, repos) = repositories(OverdraftPolicy::Deny);
    for (name, repo) in repos {
        let first = create(repo.as_ref(), "dup@x.com", 0);
        create(repo.as_ref(), "dup@x.com", 0);

        let found = repo.get_account_by_email("dup@x.com").unwrap();
        assert_eq!(found.id, first.id, "{}", name);
        assert!(
            matches!(repo.get_account_by_email("none@x.com"), Err(Error::NotFound(_))),
            "{}",
            name
        );
    }
}

#[test]
fn test_password_hash_survives_storage() {
    let (_dir, repos) = repositories(OverdraftPolicy::Deny);
    for (name, repo) in repos {
        let mut account = Account::open("johndoe", Some("securepassword123")).unwrap();
        repo.create_account(&mut account).unwrap();

        let stored = repo.get_account_by_email("johndoe").unwrap();
        assert!(stored.verify_password("securepassword123").is_ok(), "{}", name);
    }
}

// ============================================================================
// Transfer
// ============================================================================

#[test]
fn test_transfer_moves_balance_and_conserves_total() {
    let (_dir, repos) = repositories(OverdraftPolicy::Deny);
    for (name, repo) in repos {
        let a = create(repo.as_ref(), "a@x.com", 1_000);
        let b = create(repo.as_ref(), "b@x.com", 250);

        let receipt = repo.transfer(a.id, b.id, 400).unwrap();
        assert_eq!(receipt.from_balance, 600, "{}", name);
        assert_eq!(receipt.to_balance, 650, "{}", name);

        let a_after = repo.get_account(a.id).unwrap().balance;
        let b_after = repo.get_account(b.id).unwrap().balance;
        assert_eq!(a_after, 600, "{}", name);
        assert_eq!(b_after, 650, "{}", name);
        assert_eq!(a_after + b_after, 1_250, "{}", name);
    }
}

#[test]
fn test_insufficient_funds_rolls_back() {
    let (_dir, repos) = repositories(OverdraftPolicy::Deny);
    for (name, repo) in repos {
        let a = create(repo.as_ref(), "a@x.com", 100);
        let b = create(repo.as_ref(), "b@x.com", 0);

        let err = repo.transfer(a.id, b.id, 101).unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds { .. }), "{}: {}", name, err);

        assert_eq!(repo.get_account(a.id).unwrap().balance, 100, "{}", name);
        assert_eq!(repo.get_account(b.id).unwrap().balance, 0, "{}", name);
    }
}

#[test]
fn test_transfer_past_deadline_rolls_back() {
    let (_dir, repos) = repositories(OverdraftPolicy::Deny);
    for (name, repo) in repos {
        let a = create(repo.as_ref(), "a@x.com", 100);
        let b = create(repo.as_ref(), "b@x.com", 0);

        let err = repo
            .transfer_until(a.id, b.id, 40, Some(Instant::now()))
            .unwrap_err();
        assert!(matches!(err, Error::DeadlineExceeded(_)), "{}: {}", name, err);
        assert_eq!(repo.get_account(a.id).unwrap().balance, 100, "{}", name);
        assert_eq!(repo.get_account(b.id).unwrap().balance, 0, "{}", name);

        let later = Instant::now() + Duration::from_secs(60);
        let receipt = repo.transfer_until(a.id, b.id, 40, Some(later)).unwrap();
        assert_eq!(receipt.from_balance, 60, "{}", name);
        assert_eq!(repo.get_account(b.id).unwrap().balance, 40, "{}", name);
    }
}

#[test]
fn test_transfer_with_missing_account_changes_nothing() {
    let (_dir, repos) = repositories(OverdraftPolicy::Deny);
    for (name, repo) in repos {
        let a = create(repo.as_ref(), "a@x.com", 100);

        assert!(matches!(repo.transfer(a.id, 999, 10), Err(Error::NotFound(_))), "{}", name);
        assert!(matches!(repo.transfer(999, a.id, 10), Err(Error::NotFound(_))), "{}", name);
        assert_eq!(repo.get_account(a.id).unwrap().balance, 100, "{}", name);
    }
}

#[test]
fn test_overdraft_policy_allows_negative_balance() {
    let (_dir, repos) = repositories(OverdraftPolicy::Allow);
    for (name, repo) in repos {
        let a = create(repo.as_ref(), "a@x.com", 10);
        let b = create(repo.as_ref(), "b@x.com", 0);

        repo.transfer(a.id, b.id, 25).unwrap();
        assert_eq!(repo.get_account(a.id).unwrap().balance, -15, "{}", name);
        assert_eq!(repo.get_account(b.id).unwrap().balance, 25, "{}", name);
    }
}

#[test]
fn test_concurrent_transfers_conserve_total() {
    const THREADS: i64 = 4;
    const TRANSFERS_PER_THREAD: i64 = 10;

    let (_dir, repos) = repositories(OverdraftPolicy::Deny);
    for (name, repo) in repos {
        let a = create(repo.as_ref(), "a@x.com", 1_000);
        let b = create(repo.as_ref(), "b@x.com", 1_000);

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let repo = Arc::clone(&repo);
                thread::spawn(move || {
                    for _ in 0..TRANSFERS_PER_THREAD {
                        // Alternate direction per thread
                        let (from, to) = if t % 2 == 0 { (a.id, b.id) } else { (b.id, a.id) };
                        repo.transfer(from, to, 7).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let total =
            repo.get_account(a.id).unwrap().balance + repo.get_account(b.id).unwrap().balance;
        assert_eq!(total, 2_000, "{}", name);
    }
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_file_database_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("ledger.duckdb");

    let id = {
        let repo = DuckDbRepository::new(&db_path, OverdraftPolicy::Deny).unwrap();
        repo.ensure_schema().unwrap();
        create(&repo, "a@x.com", 77).id
    };

    let repo = DuckDbRepository::new(&db_path, OverdraftPolicy::Deny).unwrap();
    repo.ensure_schema().unwrap();
    let account = repo.get_account(id).unwrap();
    assert_eq!(account.email, "a@x.com");
    assert_eq!(account.balance, 77);

    // Sequence keeps counting after reopen
    let next = create(&repo, "b@x.com", 0);
    assert!(next.id > id);
}
