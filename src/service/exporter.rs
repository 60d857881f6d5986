use crate::error::ExportError;
use crate::models::ScanEvent;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// CSV 表头 (固定)
const CSV_HEADER: [&str; 5] = ["timestamp", "orderId", "sku", "quantity", "source"];

/// 把一段扫码事件渲染成 CSV 文档
///
/// 每条事件一行, 按插入顺序; 时间戳渲染为 UTC ISO-8601 (零时区偏移),
/// source 渲染为枚举字面量。字段值假定为条码安全的 ASCII, 不做引号
/// 转义; 写入前校验, 含分隔符/引号/换行的值报错而不是静默写出坏行。
pub fn render_csv(events: &[ScanEvent]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for event in events {
        check_field(&event.order_id)?;
        check_field(&event.sku)?;
        writer.write_record([
            event
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            event.order_id.clone(),
            event.sku.clone(),
            event.quantity.to_string(),
            event.source.as_str().to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Buffer(e.to_string()))
}

/// 条码来源的字段校验 (QuoteStyle::Never 自身不报错, 会原样写出坏行)
fn check_field(value: &str) -> Result<(), ExportError> {
    if value.chars().any(|c| matches!(c, ',' | '"' | '\n' | '\r')) {
        return Err(ExportError::UnsafeField(value.to_string()));
    }
    Ok(())
}

/// 把当前会话的扫码日志导出为 CSV 文件
///
/// 对日志快照的只读幂等操作; 目录不存在时创建。
/// 文件名: `kitoko_packer_<epoch秒>.csv`。
pub fn export_to_dir(
    dir: &Path,
    events: &[ScanEvent],
    now: DateTime<Utc>,
) -> Result<PathBuf, ExportError> {
    let document = render_csv(events)?;
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("kitoko_packer_{}.csv", now.timestamp()));
    fs::write(&path, document)?;
    Ok(path)
}
