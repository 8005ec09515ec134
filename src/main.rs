#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tabsight_lib::run().await
}
