use crate::client::decode;
use crate::region::Region;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const TASK_DETAIL_URL: &str = "/api/notify/tasks";

/// An asynchronous job on the vendor side, e.g. a template deploy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Task {
    #[serde(deserialize_with = "crate::de::string")]
    pub id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub code: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub name: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub description: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub time_create: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub time_start: String,
    /// Null while the task runs.
    pub time_end: Value,
    #[serde(deserialize_with = "crate::de::int")]
    pub status: i64,
    #[serde(deserialize_with = "crate::de::string")]
    pub create_login_name: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub create_login_id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub create_login_ip: String,
    pub cancel_login_name: Value,
    pub cancel_login_ip: Value,
    #[serde(deserialize_with = "crate::de::string")]
    pub target_name: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub pool_id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub cluster_id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub host_id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub domain_id: String,
    pub business_group_id: Value,
    #[serde(deserialize_with = "crate::de::string")]
    pub module: String,
    #[serde(deserialize_with = "crate::de::int")]
    pub step_count: i64,
    #[serde(deserialize_with = "crate::de::int")]
    pub step_index: i64,
    #[serde(deserialize_with = "crate::de::string")]
    pub step_desc: String,
}

impl Task {
    pub fn is_finished(&self) -> bool {
        !self.time_end.is_null()
    }
}

impl Region {
    pub async fn get_task(&self, id: &str) -> Result<Task> {
        let url = format!("{}/{}", TASK_DETAIL_URL, id);
        let resp = self
            .client()
            .get(&url, &[])
            .await
            .with_context(|| format!("GetTask {}", id))?;
        decode(resp, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mock_json, test_region};
    use mockito::Server;

    #[tokio::test]
    async fn test_get_task() {
        let mut server = Server::new_async().await;
        let region = test_region(&mut server).await;
        mock_json(
            &mut server,
            "GET",
            "/api/notify/tasks/t-1",
            r#"{"id":"t-1","code":"DEPLOY","name":"deploy template","timeCreate":"2024-01-01 10:00:00",
                "timeEnd":null,"status":1,"domainId":"vm-1","stepCount":4,"stepIndex":2,"stepDesc":"copy disk",
                "cancelLoginName":null}"#,
        )
        .await;
        mock_json(
            &mut server,
            "GET",
            "/api/notify/tasks/t-2",
            r#"{"id":"t-2","status":"2","timeEnd":"2024-01-01 10:05:00","stepCount":"3","stepIndex":3}"#,
        )
        .await;

        let running = region.get_task("t-1").await.unwrap();
        assert_eq!(running.code, "DEPLOY");
        assert_eq!(running.domain_id, "vm-1");
        assert_eq!(running.step_count, 4);
        assert_eq!(running.step_index, 2);
        assert_eq!(running.step_desc, "copy disk");
        assert!(!running.is_finished());

        let done = region.get_task("t-2").await.unwrap();
        assert_eq!(done.status, 2);
        assert_eq!(done.step_count, 3);
        assert!(done.is_finished());
    }

    #[tokio::test]
    async fn test_get_task_reports_vendor_error() {
        let mut server = Server::new_async().await;
        let region = test_region(&mut server).await;
        mock_json(
            &mut server,
            "GET",
            "/api/notify/tasks/t-9",
            r#"{"errorCode":"404","message":"task not found","exception":""}"#,
        )
        .await;

        let err = region.get_task("t-9").await.unwrap_err();
        assert!(format!("{:#}", err).contains("task not found"));
        assert!(err.to_string().contains("GetTask t-9"));
    }
}
