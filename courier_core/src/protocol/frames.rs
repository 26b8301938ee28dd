/**
 * Stack capture for notices.
 *
 * Converts `backtrace::Backtrace` into the `BacktraceFrame` records the
 * collector understands. Frames with neither a file nor a function name
 * (runtime and linker trampolines) are skipped.
 */
use super::types::BacktraceFrame;

/// Captures and resolves a backtrace at the current call site.
pub fn capture_backtrace() -> Vec<BacktraceFrame> {
    let bt = backtrace::Backtrace::new();
    convert_backtrace(&bt)
}

/// Converts an already resolved backtrace, most recent call first.
pub fn convert_backtrace(bt: &backtrace::Backtrace) -> Vec<BacktraceFrame> {
    let mut frames = Vec::new();

    for frame in bt.frames() {
        for symbol in frame.symbols() {
            let function = symbol.name().map(|n| n.to_string());
            let file = symbol.filename().map(|p| p.display().to_string());

            if function.is_none() && file.is_none() {
                continue;
            }

            frames.push(BacktraceFrame {
                file: file.unwrap_or_else(|| "<unknown>".to_string()),
                line: symbol.lineno().unwrap_or(0),
                column: symbol.colno(),
                function: function.unwrap_or_else(|| "<unknown>".to_string()),
            });
        }
    }

    frames
}
