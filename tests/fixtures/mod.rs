// テスト用の画像ファイル生成ヘルパー
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// グラデーションのPNGを書き出す（親ディレクトリも作成）
pub fn write_png(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x * 7 % 256) as u8, (y * 3 % 256) as u8, 128, 255])
    })
    .save(path)
    .unwrap();
}

/// 単色のJPEGを書き出す
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    image::RgbImage::from_pixel(width, height, image::Rgb([10, 200, 30]))
        .save(path)
        .unwrap();
}

/// a.png, nested/b.png, nested/deeper/c.jpg と対象外の notes.txt
pub fn photo_tree() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_png(&root.join("a.png"), 32, 24);
    write_png(&root.join("nested/b.png"), 20, 40);
    write_jpeg(&root.join("nested/deeper/c.jpg"), 16, 16);
    std::fs::write(root.join("notes.txt"), b"not an image").unwrap();
    temp_dir
}

/// ルートからの相対パス一覧（ディレクトリ含む）
pub fn list_tree(root: &Path) -> std::collections::BTreeSet<PathBuf> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap().path().strip_prefix(root).unwrap().to_path_buf())
        .collect()
}
