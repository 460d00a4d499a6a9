//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use water_footprint::error::WaterFootprintError;
use water_footprint::scanner;
use std::path::Path;
use tempfile::tempdir;

/// 存在しないフォルダをスキャンした場合
#[test]
fn test_scan_nonexistent_folder() {
    let result = scanner::scan_path(Path::new("/nonexistent/path/12345"), false);
    assert!(result.is_err());

    let err = result.unwrap_err();
    assert!(matches!(err, WaterFootprintError::FolderNotFound(_)));
}

/// 空のフォルダをスキャンした場合
#[test]
fn test_scan_empty_folder() {
    let dir = tempdir().expect("Failed to create temp dir");
    let result = scanner::scan_path(dir.path(), false);

    // 空フォルダはエラーではなく空のVecを返す
    assert!(result.is_ok());
    assert!(result.unwrap().is_empty());
}

/// 画像のないフォルダをスキャンした場合
#[test]
fn test_scan_folder_no_images() {
    let dir = tempdir().expect("Failed to create temp dir");

    std::fs::write(dir.path().join("test.txt"), "hello").unwrap();
    std::fs::write(dir.path().join("data.json"), "{}").unwrap();

    let result = scanner::scan_path(dir.path(), true);
    assert!(result.is_ok());
    assert!(result.unwrap().is_empty());
}

/// WaterFootprintErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        WaterFootprintError::Config("テスト設定エラー".to_string()),
        WaterFootprintError::FileNotFound("catalog.json".to_string()),
        WaterFootprintError::FolderNotFound("/path/to/folder".to_string()),
        WaterFootprintError::Store("ロック".to_string()),
        WaterFootprintError::Validation("入力".to_string()),
        WaterFootprintError::EmailAlreadyRegistered,
        WaterFootprintError::InvalidCredentials,
        WaterFootprintError::AccountInactive,
        WaterFootprintError::NotAuthenticated,
        WaterFootprintError::NotAuthorized,
        WaterFootprintError::CoefficientNotFound("id".to_string()),
        WaterFootprintError::NoImagesFound("フォルダ".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空: {:?}", err);
    }
}

/// カタログエラーの変換
#[test]
fn test_catalog_error_conversion() {
    let err = water_footprint_common::Catalog::from_json(r#"{"products": []}"#).unwrap_err();
    let err: WaterFootprintError = err.into();
    assert!(matches!(err, WaterFootprintError::Catalog(_)));
    assert!(format!("{}", err).contains("カタログ"));
}
