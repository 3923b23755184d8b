use std::error::Error;

fn main() {
    env_logger::init();

    if let Err(err) = cocotile::run() {
        eprintln!("error: {err}");
        let mut source = err.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(1);
    }
}
