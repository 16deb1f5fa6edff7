#![allow(clippy::float_cmp)]

use super::*;

fn png_header(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = PNG_SIGNATURE.to_vec();
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
    bytes
}

fn gif_header(width: u16, height: u16) -> Vec<u8> {
    let mut bytes = b"GIF89a".to_vec();
    bytes.extend_from_slice(&width.to_le_bytes());
    bytes.extend_from_slice(&height.to_le_bytes());
    bytes
}

fn asset_dir(files: &[(&str, Vec<u8>)]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("easel-assets-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    for (name, bytes) in files {
        std::fs::write(dir.join(name), bytes).unwrap();
    }
    dir
}

// =============================================================
// Headers
// =============================================================

#[test]
fn png_size_is_big_endian() {
    assert_eq!(header_size(&png_header(640, 480)), Some((640, 480)));
}

#[test]
fn gif_size_is_little_endian() {
    assert_eq!(header_size(&gif_header(300, 2)), Some((300, 2)));
}

#[test]
fn unknown_or_short_headers() {
    assert_eq!(header_size(b"<svg></svg>"), None);
    assert_eq!(header_size(&png_header(1, 1)[..20]), None);
    assert_eq!(header_size(b"GIF89a"), None);
}

// =============================================================
// Loading
// =============================================================

#[tokio::test]
async fn loads_size_from_disk() {
    let root = asset_dir(&[("cat.png", png_header(64, 48)), ("dog.gif", gif_header(10, 20))]);
    let loader = FileImageLoader::new(&root);
    let cat = loader.load("cat.png").await.unwrap();
    assert_eq!(cat, ImageHandle { key: "cat.png".to_owned(), width: 64.0, height: 48.0 });
    let dog = loader.load("file://dog.gif").await.unwrap();
    assert_eq!((dog.width, dog.height), (10.0, 20.0));
}

#[tokio::test]
async fn missing_and_unsupported_files_fail() {
    let root = asset_dir(&[("notes.txt", b"hello".to_vec())]);
    let loader = FileImageLoader::new(&root);
    assert!(matches!(loader.load("gone.png").await, Err(LoadError::Image { .. })));
    let err = loader.load("notes.txt").await.unwrap_err();
    assert!(err.to_string().contains("unsupported image format"));
}

#[tokio::test]
async fn paths_cannot_escape_the_root() {
    let loader = FileImageLoader::new(asset_dir(&[]));
    assert!(matches!(loader.load("../secret.png").await, Err(LoadError::Image { .. })));
    assert!(matches!(loader.load("/etc/passwd").await, Err(LoadError::Image { .. })));
}
