/**
 * Minimal harness for the Courier SDK.
 *
 * Fill in PROJECT_ID / PROJECT_KEY from your collector project settings,
 * then run:
 *
 *   RUST_LOG=debug cargo run -p courier_demo
 *   RUST_LOG=debug cargo run -p courier_demo -- --flood   # overflow the queue
 *   cargo run -p courier_demo -- --deploy                 # announce a deploy
 */
use std::time::Duration;

use tracing_subscriber::EnvFilter;

const PROJECT_ID: u64 = 1;
const PROJECT_KEY: &str = "PASTE_YOUR_PROJECT_KEY_HERE";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let flood = args.iter().any(|a| a == "--flood");
    let deploy = args.iter().any(|a| a == "--deploy");

    /*
     * A tiny queue makes --flood hit the capacity limit quickly.
     */
    let _guard = match courier::init(courier::Config {
        project_id: Some(PROJECT_ID),
        project_key: Some(PROJECT_KEY.into()),
        environment: Some("development".into()),
        queue_size: if flood { 2 } else { 100 },
        ..Default::default()
    }) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("[demo] init failed: {err}");
            return;
        }
    };

    let handle = courier::notify_message("Hello from Courier!");
    handle.on_complete(|outcome| println!("[demo] message outcome: {outcome:?}"));

    if let Err(e) = std::fs::read_to_string("/nonexistent/path.txt") {
        let handle = courier::notify(&e);
        match handle.wait_timeout(Duration::from_secs(10)) {
            Some(outcome) => println!("[demo] io::Error outcome: {outcome:?}"),
            None => println!("[demo] io::Error still pending after 10s"),
        }
    }

    if flood {
        let rejected = (0..20)
            .map(|i| courier::notify_message(&format!("flood #{i}")))
            .filter(courier::ResultHandle::is_rejected)
            .count();
        println!("[demo] {rejected} of 20 flood notices rejected at capacity");
    }

    if deploy {
        let outcome = courier::notify_deploy(courier::DeployInfo {
            username: Some("demo".into()),
            revision: Some("0123abcd".into()),
            ..Default::default()
        })
        .wait();
        println!("[demo] deploy outcome: {outcome:?}");
    }

    println!("[demo] Done. Queued notices are delivered when _guard drops.");
}
