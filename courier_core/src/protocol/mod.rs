/*!
 * Protocol layer: what we send to the collector.
 *
 * - `types`: Notice, NoticeError, BacktraceFrame, DeployInfo
 * - `constants`: notifier identity and the default log label
 * - `frames`: conversion from `backtrace::Backtrace` to `BacktraceFrame`
 */

pub mod constants;
pub mod frames;
pub mod types;
