use spine_ngin::runtime::extension::{self, FileError};

use crate::common::test_utils::{Fixture, init_logger};

mod common;

#[test]
fn zero_size_allocation_is_null() {
    init_logger();
    assert!(extension::allocate(0).is_null());
}

#[test]
fn free_of_null_is_a_noop() {
    unsafe { extension::deallocate(std::ptr::null_mut()) };
}

#[test]
fn allocations_round_trip() {
    let ptr = extension::allocate(32);
    assert!(!ptr.is_null());
    unsafe {
        for i in 0..32 {
            ptr.add(i).write(i as u8);
        }
        for i in 0..32 {
            assert_eq!(ptr.add(i).read(), i as u8);
        }
        extension::deallocate(ptr);
    }
}

#[test]
fn realloc_preserves_contents_and_zero_frees() {
    let ptr = extension::allocate(8);
    assert!(!ptr.is_null());
    unsafe {
        for i in 0..8 {
            ptr.add(i).write(0xA0 | i as u8);
        }
        let grown = extension::reallocate(ptr, 64);
        assert!(!grown.is_null());
        for i in 0..8 {
            assert_eq!(grown.add(i).read(), 0xA0 | i as u8);
        }
        assert!(extension::reallocate(grown, 0).is_null());
    }
}

#[test]
fn read_file_round_trips() {
    let fixture = Fixture::new("read-file");
    let path = fixture.write_bytes("blob.bin", &[1, 2, 3, 4, 5]);
    let buffer = extension::read_file(&path).unwrap();
    assert_eq!(&*buffer, &[1, 2, 3, 4, 5]);
}

#[test]
fn read_of_empty_file_yields_empty_buffer() {
    let fixture = Fixture::new("read-empty");
    let path = fixture.write_bytes("empty.bin", &[]);
    let buffer = extension::read_file(&path).unwrap();
    assert!(buffer.is_empty());
    assert_eq!(&*buffer, &[] as &[u8]);
}

#[test]
fn read_of_missing_file_fails() {
    let fixture = Fixture::new("read-missing");
    let missing = fixture.path("nope.bin");
    match extension::read_file(&missing) {
        Err(FileError::NotFound(path)) => assert_eq!(path, missing),
        other => panic!("expected NotFound, got {other:?}"),
    }
}
