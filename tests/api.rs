mod helpers;

use game_notifier_api_structs::get_service_health::APIResponse;
use helpers::setup::spawn_app;

#[actix_web::test]
async fn test_status_ok() {
    let address = spawn_app().await;

    let res = reqwest::get(format!("{}/api/v1/healthcheck", address))
        .await
        .expect("Status server to respond");
    assert!(res.status().is_success());
    let body = res.json::<APIResponse>().await.expect("Valid status body");
    assert_eq!(body.message, "Yo! We are up!\r\n");
}
