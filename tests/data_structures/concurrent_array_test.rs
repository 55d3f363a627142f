/*!
 * Concurrent Array Tests
 */

use ai_os_sync::core::data_structures::ConcurrentArray;
use ai_os_sync::SyncError;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn test_get_past_end_is_out_of_range() {
    let array = ConcurrentArray::new();
    assert_eq!(array.get(0), Err(SyncError::IndexOutOfRange { index: 0, len: 0 }));

    array.push_back(1);
    assert_eq!(array.get(0), Ok(1));
    assert!(matches!(
        array.get(1),
        Err(SyncError::IndexOutOfRange { index: 1, len: 1 })
    ));
}

#[test]
fn test_update_in_place() {
    let array = ConcurrentArray::from(vec![0; 4]);
    for i in 0..4 {
        array.update(i, i * 2).unwrap();
    }
    assert_eq!(array.snapshot(), vec![0, 2, 4, 6]);
    assert!(array.update(4, 8).is_err());
    assert_eq!(array.size(), 4);
}

#[test]
fn test_snapshot_during_appends_is_a_prefix() {
    let array = Arc::new(ConcurrentArray::new());
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let array = array.clone();
        let done = done.clone();
        thread::spawn(move || {
            for i in 0..5000u32 {
                array.push_back(i);
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let mut checked = 0;
    while !done.load(Ordering::SeqCst) {
        let snapshot = array.snapshot();
        // Appends are in order, so every snapshot must be 0..len exactly
        for (index, value) in snapshot.iter().enumerate() {
            assert_eq!(*value as usize, index);
        }
        checked += 1;
    }
    writer.join().unwrap();

    assert!(checked > 0);
    assert_eq!(array.snapshot().len(), 5000);
}

#[test]
fn test_contains_and_clear() {
    let array = ConcurrentArray::new();
    array.push_back(String::from("alpha"));
    array.push_back(String::from("beta"));

    assert!(array.contains(&String::from("beta")));
    array.clear();
    assert!(!array.contains(&String::from("beta")));
    assert!(array.is_empty());
}
