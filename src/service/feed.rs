use futures::{Stream, StreamExt};
use std::time::{Duration, Instant};

/// 同值重复扫码的抑制窗口
pub const DUPLICATE_SUPPRESSION: Duration = Duration::from_millis(1200);

/// 扫码源去重器
///
/// 解码出的条码值与上一次发出的值相同且间隔不超过 1200ms 时丢弃;
/// 值变化或超窗即发出并刷新记录 (被抑制的帧不刷新时间戳)。
/// 空白帧直接丢弃。状态机下游把送达的每条串当作已去重处理。
#[derive(Debug, Default)]
pub struct ScanDebouncer {
    last_value: Option<String>,
    last_emitted: Option<Instant>,
}

impl ScanDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, raw: &str, now: Instant) -> Option<String> {
        if raw.trim().is_empty() {
            return None;
        }
        if let (Some(last), Some(at)) = (self.last_value.as_deref(), self.last_emitted) {
            if last == raw && now.duration_since(at) <= DUPLICATE_SUPPRESSION {
                return None;
            }
        }
        self.last_value = Some(raw.to_string());
        self.last_emitted = Some(now);
        Some(raw.to_string())
    }
}

/// 给任意原始扫码流套上去重策略
pub fn debounced<S>(feed: S) -> impl Stream<Item = String>
where
    S: Stream<Item = String>,
{
    let mut debouncer = ScanDebouncer::new();
    feed.filter_map(move |raw| {
        let accepted = debouncer.accept(&raw, Instant::now());
        futures::future::ready(accepted)
    })
}
