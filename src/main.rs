use anyhow::Context;
use clap::Parser;
use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::Level;
use water_footprint::auth::AuthService;
use water_footprint::cli::{Cli, CoefficientAction, Commands};
use water_footprint::coefficients::{parse_base_liters, CoefficientInput, CoefficientService};
use water_footprint::config::Config;
use water_footprint::error::WaterFootprintError;
use water_footprint::history::HistoryService;
use water_footprint::store::FileStore;
use water_footprint::estimator::estimate_images;
use water_footprint::{export, scanner, Estimator};
use water_footprint_common::{EstimationResult, Summary};

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// 1234567.8 → "1,234,567.8"
fn format_liters(liters: f64) -> String {
    let text = format!("{:.1}", liters);
    let (int_part, frac) = text.split_once('.').unwrap_or((text.as_str(), "0"));
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}.{}", sign, grouped, frac)
}

fn prompt_password(confirm: bool) -> anyhow::Result<String> {
    let mut prompt = Password::new().with_prompt("パスワード");
    if confirm {
        prompt = prompt.with_confirmation("パスワード（確認）", "パスワードが一致しません");
    }
    Ok(prompt.interact()?)
}

fn print_summary(summary: &Summary) {
    println!("解析回数: {}", summary.total_analyses);
    println!("仮想水合計: {} L", format_liters(summary.total_water_liters));

    if !summary.top_products.is_empty() {
        println!("\n水使用量の多い商品:");
        for (i, product) in summary.top_products.iter().enumerate() {
            println!(
                "  {}. {} - {} L ({}回)",
                i + 1,
                product.product_name,
                format_liters(product.water_liters),
                product.count
            );
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load().context("設定の読み込みに失敗しました")?;
    let store_path = match cli.store.clone() {
        Some(path) => path,
        None => config.resolve_store_path()?,
    };
    let store = FileStore::open(store_path);
    let auth = AuthService::from_config(&store, &config)?;

    match cli.command {
        Commands::Register { name, email, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt_password(true)?,
            };
            let user = auth.register(&name, &email, &password)?;
            println!("✔ 登録しました: {} <{}>", user.name, user.email);
            if user.is_admin() {
                println!("  最初のユーザーのため管理者になりました");
            }
        }

        Commands::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt_password(false)?,
            };
            let user = auth.login(&email, &password)?;
            println!("✔ ログインしました: {}", user.name);
        }

        Commands::Logout => {
            auth.logout()?;
            println!("✔ ログアウトしました");
        }

        Commands::Whoami => match auth.current_user()? {
            Some(user) => {
                println!("{} <{}>", user.name, user.email);
                println!("  ロール: {}", user.role);
                println!("  登録日: {}", user.created_at.format("%Y-%m-%d"));
            }
            None => println!("ログインしていません"),
        },

        Commands::Analyze { path, recursive, embed, output } => {
            println!("💧 water-footprint - 写真解析\n");
            let user = auth.require_user()?;

            // 1. 画像スキャン
            println!("[1/3] 写真をスキャン中...");
            let images = scanner::scan_path(&path, recursive)?;
            if images.is_empty() {
                return Err(WaterFootprintError::NoImagesFound(path.display().to_string()).into());
            }
            println!("✔ {}枚の写真を検出\n", images.len());

            // 2. 推定
            println!("[2/3] 推定中...");
            let estimator = Estimator::new(config.load_catalog()?)?
                .with_processing_delay(config.processing_delay());
            let pb = ProgressBar::new(images.len() as u64);
            pb.set_style(ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")?);
            let outcome = estimate_images(
                &estimator,
                images,
                embed || config.embed_images,
                config.concurrency,
                &pb,
            )
            .await;
            pb.finish_and_clear();

            let results = outcome.results;
            println!("✔ 推定完了 ({}枚)", results.len());
            for failure in &outcome.failures {
                println!("  ⚠ スキップ: {} ({})", failure.image.file_name, failure.reason);
            }
            println!();

            // 3. 履歴に保存
            println!("[3/3] 履歴に保存中...");
            let history = HistoryService::new(&store);
            for (image, result) in &results {
                history.record(&user, result)?;
                println!(
                    "  {} → {}: {} L (信頼度 {:.0}%)",
                    image.file_name,
                    result.product_name,
                    format_liters(result.water_liters),
                    result.confidence * 100.0
                );
            }

            if let Some(output) = output {
                let plain: Vec<&EstimationResult> = results.iter().map(|(_, r)| r).collect();
                std::fs::write(&output, serde_json::to_string_pretty(&plain)?)
                    .with_context(|| format!("結果を保存できません: {}", output.display()))?;
                println!("✔ 結果を保存: {}", output.display());
            }

            println!("\n✅ 解析完了");
        }

        Commands::History { limit, export: export_to, format, title } => {
            let user = auth.require_user()?;
            let history = HistoryService::new(&store);
            let events = history.events_for(&user.id)?;

            if events.is_empty() {
                println!("履歴がありません。`water-footprint analyze` で写真を解析してください");
            }

            let shown = limit.unwrap_or(events.len()).min(events.len());
            for event in &events[..shown] {
                println!(
                    "{}  {:<16} {:>12} L  {:>3.0}%",
                    event.created_at.format("%Y-%m-%d %H:%M"),
                    event.product_name,
                    format_liters(event.water_liters),
                    event.confidence * 100.0
                );
            }

            if let Some(target) = export_to {
                let summary = history.summary_for(&user.id)?;
                export::export_history(&events, &summary, &format, &target, &title)?;
            }
        }

        Commands::Summary => {
            let user = auth.require_user()?;
            let summary = HistoryService::new(&store).summary_for(&user.id)?;
            print_summary(&summary);
        }

        Commands::Coefficient { action } => {
            let admin = auth.require_admin()?;
            let service = CoefficientService::new(&store);

            match action {
                CoefficientAction::List => {
                    let coefficients = service.list(&admin)?;
                    if coefficients.is_empty() {
                        println!("係数はまだ登録されていません");
                    }
                    for c in coefficients {
                        println!(
                            "{}  {:<16} {:<12} {:>10} L/{}",
                            c.id,
                            c.product_name,
                            c.category,
                            format_liters(c.base_liters),
                            c.unit
                        );
                    }
                }
                CoefficientAction::Add { product, category, unit, liters } => {
                    let input = CoefficientInput {
                        product_name: product,
                        category,
                        unit,
                        base_liters: parse_base_liters(&liters)?,
                    };
                    let added = service.add(&admin, input)?;
                    println!("✔ 係数を追加しました: {} ({})", added.product_name, added.id);
                }
                CoefficientAction::Update { id, product, category, unit, liters } => {
                    let input = CoefficientInput {
                        product_name: product,
                        category,
                        unit,
                        base_liters: parse_base_liters(&liters)?,
                    };
                    let updated = service.update(&admin, &id, input)?;
                    println!("✔ 係数を更新しました: {}", updated.product_name);
                }
                CoefficientAction::Delete { id } => {
                    service.delete(&admin, &id)?;
                    println!("✔ 係数を削除しました: {}", id);
                }
            }
        }

        Commands::Catalog { bucket } => {
            let catalog = config.load_catalog()?;

            match bucket {
                Some(bucket) => {
                    println!("{} の候補:", bucket);
                    for product in catalog.candidates(bucket) {
                        println!("  {:<16} {:>10} L", product.name, format_liters(product.base_liters));
                    }
                }
                None => {
                    println!("商品カタログ ({}件):", catalog.len());
                    for product in &catalog.products {
                        println!(
                            "  {:<16} {:<10} {:>10} L",
                            product.name,
                            product.category,
                            format_liters(product.base_liters)
                        );
                    }
                    println!("\n色バケット → 候補:");
                    for (bucket, names) in &catalog.buckets {
                        println!("  {:<8} {}", bucket, names.join(", "));
                    }
                    println!("  (その他は全商品)");
                }
            }
        }

        Commands::Config { set_store, set_catalog, set_delay_ms, show } => {
            let mut config = config;
            let changed = set_store.is_some() || set_catalog.is_some() || set_delay_ms.is_some();

            if let Some(path) = set_store {
                config.store_path = Some(path);
            }
            if let Some(path) = set_catalog {
                config.catalog_path = Some(path);
            }
            if let Some(ms) = set_delay_ms {
                config.processing_delay_ms = ms;
            }
            if changed {
                config.save()?;
                println!("✔ 設定を保存しました");
            }

            if show || !changed {
                let display_path = |p: &Option<PathBuf>| {
                    p.as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "（既定）".into())
                };
                println!("設定:");
                println!("  ストア: {}", config.resolve_store_path()?.display());
                println!("  カタログ: {}", display_path(&config.catalog_path));
                println!("  待ち時間: {}ms", config.processing_delay_ms);
                println!("  同時解析数: {}", config.concurrency);
                println!("  トークン有効期間: {}時間", config.token_ttl_hours);
                println!("  画像埋め込み: {}", if config.embed_images { "有効" } else { "無効" });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_liters() {
        assert_eq!(format_liters(0.0), "0.0");
        assert_eq!(format_liters(214.0), "214.0");
        assert_eq!(format_liters(15415.26), "15,415.3");
        assert_eq!(format_liters(1234567.8), "1,234,567.8");
    }
}
