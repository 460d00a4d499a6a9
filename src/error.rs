use thiserror::Error;

#[derive(Error, Debug)]
pub enum WaterFootprintError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("ストアエラー: {0}")]
    Store(String),

    #[error("カタログエラー: {0}")]
    Catalog(#[from] water_footprint_common::Error),

    #[error("入力エラー: {0}")]
    Validation(String),

    #[error("このメールアドレスは既に登録されています")]
    EmailAlreadyRegistered,

    #[error("メールアドレスまたはパスワードが正しくありません")]
    InvalidCredentials,

    #[error("アカウントが無効化されています")]
    AccountInactive,

    #[error("ログインしていません。`water-footprint login` でログインしてください")]
    NotAuthenticated,

    #[error("この操作には管理者権限が必要です")]
    NotAuthorized,

    #[error("係数が見つかりません: {0}")]
    CoefficientNotFound(String),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rust_xlsxwriter::XlsxError> for WaterFootprintError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        WaterFootprintError::ExcelGeneration(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WaterFootprintError>;
