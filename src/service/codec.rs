use crate::models::{InvoiceItem, InvoicePayload};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use serde_json::Value;

/// 装箱单二维码前缀
pub const INVOICE_PREFIX: &str = "PKG1:";
/// 单品令牌前缀
pub const PRODUCT_PREFIX: &str = "PKT1:";

/// 解码装箱单载荷: `"PKG1:" + base64url(JSON)`
///
/// JSON 结构 `{"o": "<订单号>", "i": [["<sku>", <件数>], ...]}`。
/// 生产端可能省略 base64 填充, 解码前补齐到 4 的倍数。
/// 任何失败 (前缀缺失 / base64 非法 / JSON 非法 / 订单号为空) 都返回
/// `None`, 不向调用方抛错; 非法明细行单独跳过, 不影响整单。
pub fn decode_invoice(raw: &str) -> Option<InvoicePayload> {
    let encoded = raw.strip_prefix(INVOICE_PREFIX)?;
    let root = decode_json(encoded)?;
    let order_id = root.get("o")?.as_str()?;
    if order_id.trim().is_empty() {
        return None;
    }

    let mut items = Vec::new();
    if let Some(entries) = root.get("i").and_then(Value::as_array) {
        for entry in entries {
            // 明细行必须是 [sku, units] 形式的数组, 首元素非空; 件数缺省为 0
            let Some(pair) = entry.as_array() else {
                continue;
            };
            let Some(sku) = pair.first().and_then(Value::as_str) else {
                continue;
            };
            if sku.trim().is_empty() {
                continue;
            }
            // 件数缺省为 0, 负数归零, 超出 u32 饱和而不是回绕
            let units = match pair.get(1).and_then(Value::as_i64) {
                Some(n) if n < 0 => 0,
                Some(n) => u32::try_from(n).unwrap_or(u32::MAX),
                None => 0,
            };
            items.push(InvoiceItem {
                sku: sku.to_string(),
                units,
            });
        }
    }

    Some(InvoicePayload {
        order_id: order_id.to_string(),
        items,
    })
}

/// 解码单品令牌: `"PKT1:" + base64url({"s": "<sku>"})` 或裸 SKU 字符串
///
/// PKT1 令牌解码失败或 `s` 为空返回 `None`; 裸令牌去首尾空白后直接接受。
/// 为统一比较, 单品 SKU 在解码时转大写 (装箱单明细 SKU 不做改写)。
pub fn decode_product_token(raw: &str) -> Option<String> {
    if let Some(encoded) = raw.strip_prefix(PRODUCT_PREFIX) {
        let root = decode_json(encoded)?;
        let sku = root.get("s")?.as_str()?;
        if sku.trim().is_empty() {
            return None;
        }
        Some(sku.to_uppercase())
    } else {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_uppercase())
        }
    }
}

fn decode_json(encoded: &str) -> Option<Value> {
    let bytes = URL_SAFE.decode(pad_base64(encoded)).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    serde_json::from_str(&text).ok()
}

/// 补齐被省略的 base64 填充
fn pad_base64(value: &str) -> String {
    match value.len() % 4 {
        0 => value.to_string(),
        rem => format!("{}{}", value, "=".repeat(4 - rem)),
    }
}
