use std::io;

use hello_client::{run_session, ClientConfig};

fn main() {
    env_logger::init();

    let mut input = io::stdin().lock();
    let mut output = io::stdout();

    if let Err(e) = run_session(&mut input, &mut output, &ClientConfig::default()) {
        log::debug!("Session failed: {e:?}");
        eprintln!("{e}");
        std::process::exit(e.exit_code());
    }
}
