//! 履歴・サマリーのExcel出力

use crate::error::Result;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};
use std::path::Path;
use water_footprint_common::{EstimationEvent, Summary};

const HISTORY_HEADERS: [&str; 5] = ["日時", "商品", "仮想水 (L)", "信頼度", "画像"];

pub fn generate_excel(events: &[EstimationEvent], summary: &Summary, output_path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xDDEBF7))
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin);
    let liters_format = Format::new().set_num_format("#,##0.0");
    let percent_format = Format::new().set_num_format("0%");

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("履歴")?;

        for (col, header) in HISTORY_HEADERS.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }

        for (i, event) in events.iter().enumerate() {
            let row = i as u32 + 1;
            sheet.write_string(row, 0, event.created_at.format("%Y-%m-%d %H:%M").to_string())?;
            sheet.write_string(row, 1, &event.product_name)?;
            sheet.write_number_with_format(row, 2, event.water_liters, &liters_format)?;
            sheet.write_number_with_format(row, 3, event.confidence, &percent_format)?;
            // data URLはセルに収まらないので省略
            if !event.image_reference.starts_with("data:") {
                sheet.write_string(row, 4, &event.image_reference)?;
            }
        }

        sheet.set_column_width(0, 18.0)?;
        sheet.set_column_width(1, 20.0)?;
        sheet.set_column_width(2, 14.0)?;
        sheet.set_column_width(4, 40.0)?;
    }

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("サマリー")?;

        sheet.write_string_with_format(0, 0, "解析回数", &header_format)?;
        sheet.write_number(0, 1, summary.total_analyses as f64)?;
        sheet.write_string_with_format(1, 0, "仮想水合計 (L)", &header_format)?;
        sheet.write_number_with_format(1, 1, summary.total_water_liters, &liters_format)?;

        for (col, header) in ["順位", "商品", "仮想水 (L)", "回数"].iter().enumerate() {
            sheet.write_string_with_format(3, col as u16, *header, &header_format)?;
        }
        for (i, product) in summary.top_products.iter().enumerate() {
            let row = i as u32 + 4;
            sheet.write_number(row, 0, (i + 1) as f64)?;
            sheet.write_string(row, 1, &product.product_name)?;
            sheet.write_number_with_format(row, 2, product.water_liters, &liters_format)?;
            sheet.write_number(row, 3, product.count as f64)?;
        }

        sheet.set_column_width(0, 16.0)?;
        sheet.set_column_width(1, 20.0)?;
        sheet.set_column_width(2, 14.0)?;
    }

    workbook.save(output_path)?;
    Ok(())
}
