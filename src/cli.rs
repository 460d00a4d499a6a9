use clap::{Parser, Subcommand};
use std::path::PathBuf;
use water_footprint_common::ColorBucket;

#[derive(Parser)]
#[command(name = "water-footprint")]
#[command(about = "商品写真から仮想水（ウォーターフットプリント）を推定するデモツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// ストアファイル（設定より優先）
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// ユーザー登録（最初のユーザーは管理者）
    Register {
        /// 表示名
        #[arg(short, long)]
        name: String,

        /// メールアドレス
        #[arg(short, long)]
        email: String,

        /// パスワード（省略時は対話入力）
        #[arg(short, long)]
        password: Option<String>,
    },

    /// ログイン
    Login {
        /// メールアドレス
        #[arg(short, long)]
        email: String,

        /// パスワード（省略時は対話入力）
        #[arg(short, long)]
        password: Option<String>,
    },

    /// ログアウト
    Logout,

    /// ログイン中のユーザーを表示
    Whoami,

    /// 写真（ファイルまたはフォルダ）を解析して履歴に追加
    Analyze {
        /// 画像ファイルまたはフォルダ
        #[arg(required = true)]
        path: PathBuf,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,

        /// 画像をdata URLで履歴に埋め込む
        #[arg(long)]
        embed: bool,

        /// 結果をJSONファイルにも保存
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 解析履歴を表示/出力
    History {
        /// 表示件数
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// 出力先ファイル/ディレクトリ
        #[arg(long)]
        export: Option<PathBuf>,

        /// 出力形式 (json/excel/both)
        #[arg(short, long, default_value = "both")]
        format: ExportFormat,

        /// 出力ファイル名（ディレクトリ指定時）
        #[arg(short, long, default_value = "water-footprint-history")]
        title: String,
    },

    /// 合計と上位商品を表示
    Summary,

    /// 水係数テーブルの管理（管理者のみ）
    Coefficient {
        #[command(subcommand)]
        action: CoefficientAction,
    },

    /// 商品カタログと色バケットの対応を表示
    Catalog {
        /// このバケットの候補だけ表示
        #[arg(short, long)]
        bucket: Option<ColorBucket>,
    },

    /// 設定を表示/編集
    Config {
        /// ストアファイルを設定
        #[arg(long)]
        set_store: Option<PathBuf>,

        /// カタログJSONを設定
        #[arg(long)]
        set_catalog: Option<PathBuf>,

        /// 擬似解析の待ち時間（ミリ秒）
        #[arg(long)]
        set_delay_ms: Option<u64>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Subcommand)]
pub enum CoefficientAction {
    /// 一覧（商品名順）
    List,

    /// 追加
    Add {
        #[arg(long)]
        product: String,

        #[arg(long)]
        category: String,

        /// 単位
        #[arg(long, default_value = "kg")]
        unit: String,

        /// 基準水量（L）
        #[arg(long)]
        liters: String,
    },

    /// 更新
    Update {
        /// 係数ID
        #[arg(required = true)]
        id: String,

        #[arg(long)]
        product: String,

        #[arg(long)]
        category: String,

        #[arg(long, default_value = "kg")]
        unit: String,

        #[arg(long)]
        liters: String,
    },

    /// 削除
    Delete {
        /// 係数ID
        #[arg(required = true)]
        id: String,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum ExportFormat {
    Json,
    Excel,
    #[default]
    Both,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "both" => Ok(ExportFormat::Both),
            _ => Err(format!("Unknown format: {}. Use json, excel, or both", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_export_format_from_str() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("xlsx".parse::<ExportFormat>().unwrap(), ExportFormat::Excel);
        assert_eq!("both".parse::<ExportFormat>().unwrap(), ExportFormat::Both);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from(["water-footprint", "analyze", "photos", "-r", "--verbose"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Analyze { path, recursive, embed, .. } => {
                assert_eq!(path, PathBuf::from("photos"));
                assert!(recursive);
                assert!(!embed);
            }
            _ => panic!("analyzeとして解析されていません"),
        }
    }

    #[test]
    fn test_parse_catalog_bucket() {
        let cli = Cli::try_parse_from(["water-footprint", "catalog", "--bucket", "dark"]).unwrap();
        match cli.command {
            Commands::Catalog { bucket } => assert_eq!(bucket, Some(ColorBucket::Dark)),
            _ => panic!("catalogとして解析されていません"),
        }
    }
}
