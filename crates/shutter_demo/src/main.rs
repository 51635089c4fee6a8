#[tokio::main]
async fn main() {
    if let Err(e) = lib_shutter_demo::init().await {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}
