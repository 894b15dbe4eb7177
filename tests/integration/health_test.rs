use esim_fulfillment_backend::app::App;
use loco_rs::testing::prelude::*;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn health_reports_healthy_when_database_is_reachable() {
    request::<App, _, _>(|request, _ctx| async move {
        let res = request.get("/api/health").await;
        assert_eq!(res.status_code(), 200);

        let body: serde_json::Value = res.json();
        assert_eq!(body["status"], "healthy");
        assert!(body["services"]["database"].as_bool().unwrap());
        assert!(body["services"]["providers"].is_array());
        assert!(body["services"]["channels"].is_array());
        assert!(body["uptime"].is_number());
    })
    .await;
}
