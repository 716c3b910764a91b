use serde::Serialize;

use crate::bins::Bin;
use crate::detection::Detection;
use crate::user::User;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SuccessResponse<'a> {
    #[serde(rename_all = "camelCase")]
    BinDeleted { message: &'a str, deleted_bin: Bin },
    #[serde(rename_all = "camelCase")]
    Healthz {
        revision: Option<&'a str>,
        timestamp: Option<&'a str>,
        version: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    Recycle {
        message: &'a str,
        updated_user: User,
        saved_detection: Detection,
    },
}
