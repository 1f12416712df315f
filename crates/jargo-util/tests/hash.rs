use jargo_util::hash::{md5_hex, sha1_hex};

#[test]
fn test_sha1_hello_world() {
    assert_eq!(
        sha1_hex(b"hello world"),
        "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"
    );
}

#[test]
fn test_md5_hello_world() {
    assert_eq!(md5_hex(b"hello world"), "5eb63bbbe01eeed093cb22bb8f5acdc3");
}

#[test]
fn test_sha1_empty() {
    assert_eq!(sha1_hex(b""), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
}
