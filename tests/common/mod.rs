//! Shared fixtures for the integration tests: a mock platform API and
//! payload factories in the shapes the API returns.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use platform_provider::testing::ProviderTester;
use platform_provider::PlatformProvider;
use serde_json::{json, Value};
use wiremock::{MockServer, Request, Respond, ResponseTemplate};

pub const ACCOUNT_ID: &str = "acc";
pub const API_KEY: &str = "pat.acc.test";

/// Start a mock API and a provider configured against it.
pub async fn setup() -> (MockServer, ProviderTester<PlatformProvider>) {
    let server = MockServer::start().await;
    let tester = ProviderTester::connect(&server.uri(), ACCOUNT_ID, API_KEY)
        .await
        .expect("provider configures against the mock server");
    (server, tester)
}

/// Wrap a payload in the NG `{status, data, correlationId}` envelope.
pub fn envelope(data: Value) -> Value {
    json!({
        "status": "SUCCESS",
        "data": data,
        "correlationId": "3f1c2a9e-0d6b-4d0e-9a57-8e0b6f7c1d21"
    })
}

/// One page of a list endpoint, already enveloped.
pub fn page(content: Vec<Value>, page_index: i32, total_pages: i64) -> Value {
    let page_size = 100;
    envelope(json!({
        "totalPages": total_pages,
        "totalItems": total_pages * page_size,
        "pageItemCount": content.len(),
        "pageIndex": page_index,
        "pageSize": page_size,
        "content": content,
        "empty": content.is_empty()
    }))
}

pub fn not_found(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({
        "status": "ERROR",
        "code": "RESOURCE_NOT_FOUND_EXCEPTION",
        "message": message
    }))
}

pub fn repository(identifier: &str, is_public: bool) -> Value {
    json!({
        "id": 1042,
        "parent_id": 7,
        "identifier": identifier,
        "path": format!("{}/{}", ACCOUNT_ID, identifier),
        "description": "",
        "is_public": is_public,
        "created_by": 3,
        "created": 1700000000000i64,
        "updated": 1700000000000i64,
        "size": 0,
        "size_updated": 0,
        "default_branch": "main",
        "fork_id": 0,
        "num_forks": 0,
        "num_pulls": 0,
        "num_closed_pulls": 0,
        "num_open_pulls": 0,
        "num_merged_pulls": 0,
        "importing": false,
        "git_url": format!("https://git.example.com/git/{}/{}.git", ACCOUNT_ID, identifier)
    })
}

pub fn service_account(identifier: &str, name: &str, tags: Value) -> Value {
    json!({
        "identifier": identifier,
        "name": name,
        "email": format!("{}@service.example.com", identifier),
        "description": "",
        "tags": tags,
        "accountIdentifier": ACCOUNT_ID,
        "orgIdentifier": null,
        "projectIdentifier": null
    })
}

/// A connector response (`{connector, createdAt, ...}`) with the given spec.
pub fn connector(identifier: &str, name: &str, connector_type: &str, spec: Value) -> Value {
    json!({
        "connector": {
            "name": name,
            "identifier": identifier,
            "description": null,
            "orgIdentifier": null,
            "projectIdentifier": null,
            "tags": {},
            "type": connector_type,
            "spec": spec
        },
        "createdAt": 1700000000000i64,
        "lastModifiedAt": 1700000000000i64,
        "status": {"status": "SUCCESS"},
        "harnessManaged": false
    })
}

pub fn github_spec(url: &str) -> Value {
    json!({
        "url": url,
        "validationRepo": "octo/hello",
        "authentication": {
            "type": "Http",
            "spec": {
                "type": "UsernameToken",
                "spec": {"username": "octo", "usernameRef": null, "tokenRef": "account.gh_pat"}
            }
        },
        "apiAccess": null,
        "delegateSelectors": [],
        "executeOnDelegate": false,
        "type": "Account"
    })
}

/// Replays `responses` in order; the last one repeats once they run out.
pub struct Sequence {
    responses: Vec<ResponseTemplate>,
    calls: AtomicUsize,
}

impl Sequence {
    pub fn new(responses: Vec<ResponseTemplate>) -> Self {
        Self {
            responses,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Respond for Sequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let index = call.min(self.responses.len().saturating_sub(1));
        self.responses[index].clone()
    }
}
