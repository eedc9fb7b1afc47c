//! `/drivers` endpoints

use fleet_client::{ApiClient, ApiRequest, Result};
use serde::de::IgnoredAny;

use crate::types::{Driver, DriverPage, DriverUpdate};

pub async fn list(client: &ApiClient, page: Option<u32>, limit: Option<u32>) -> Result<DriverPage> {
    let request = ApiRequest::get("/drivers")
        .query_opt("page", page)
        .query_opt("limit", limit);
    client.call(request, "Failed to fetch drivers").await
}

pub async fn get(client: &ApiClient, id: &str) -> Result<Driver> {
    client
        .call(ApiRequest::get(format!("/drivers/{id}")), "Failed to fetch driver")
        .await
}

pub async fn update(client: &ApiClient, id: &str, update: DriverUpdate) -> Result<Driver> {
    let request = ApiRequest::patch(format!("/drivers/{id}")).json(&update.normalized())?;
    client.call(request, "Failed to update driver").await
}

pub async fn delete(client: &ApiClient, id: &str) -> Result<()> {
    client
        .call::<IgnoredAny>(ApiRequest::delete(format!("/drivers/{id}")), "Failed to delete driver")
        .await
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::logged_in_client;
    use crate::types::License;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn driver_json(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "userId": "u-7",
            "name": "Marta",
            "email": "marta@fleet.test",
            "phone": "0991234567",
            "license": "C",
            "birthDate": "1990-05-01",
            "isAvailable": true,
            "registrationDate": "2024-01-02T00:00:00Z",
            "updatedAt": "2024-02-03T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn list_passes_pagination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drivers"))
            .and(query_param("page", "2"))
            .and(query_param("limit", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "drivers": [driver_json("d-1")],
                "total": 11,
                "page": 2,
                "totalPages": 2
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = logged_in_client(&server.uri()).await;
        let page = list(&client, Some(2), Some(10)).await.unwrap();
        assert_eq!(page.total, 11);
        assert_eq!(page.drivers[0].license, Some(License::C));
    }

    #[tokio::test]
    async fn list_without_pagination_sends_no_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drivers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "drivers": [], "total": 0, "page": 1, "totalPages": 0
            })))
            .mount(&server)
            .await;

        let client = logged_in_client(&server.uri()).await;
        list(&client, None, None).await.unwrap();
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].url.query(), None);
    }

    #[tokio::test]
    async fn update_patches_normalized_fields() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/drivers/d-1"))
            .and(body_json(json!({"name": "Marta R.", "phone": "0990000000"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(driver_json("d-1")))
            .expect(1)
            .mount(&server)
            .await;

        let client = logged_in_client(&server.uri()).await;
        let changes = DriverUpdate {
            name: Some("Marta R.".into()),
            phone: Some("0990000000".into()),
            birth_date: Some(String::new()),
            ..DriverUpdate::default()
        };
        update(&client, "d-1", changes).await.unwrap();
    }

    #[tokio::test]
    async fn get_missing_driver_surfaces_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drivers/nope"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"message": "5 NOT_FOUND: Driver nope not found"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = logged_in_client(&server.uri()).await;
        let err = get(&client, "nope").await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.message(), "Driver nope not found");
    }

    #[tokio::test]
    async fn delete_accepts_any_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/drivers/d-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deleted": true})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/drivers/d-2"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = logged_in_client(&server.uri()).await;
        delete(&client, "d-1").await.unwrap();
        delete(&client, "d-2").await.unwrap();
    }
}
