use serde::Serialize;
use warp::reject;

use crate::errors::BackendError;

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: BackendError,
}

impl Rejection {
    pub fn new(context: Context, error: BackendError) -> Self {
        Rejection { context, error }
    }

    pub fn flatten(&self) -> FlattenedRejection {
        FlattenedRejection {
            context: self.context.clone(),
            message: format!("{}", self.error),
        }
    }
}

impl reject::Reject for Rejection {}

#[derive(Debug, Serialize)]
pub struct FlattenedRejection {
    #[serde(flatten)]
    pub(crate) context: Context,
    pub(crate) message: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Context {
    Register {},
    Login {},
    BinsList {},
    BinRetrieve { id: String },
    BinCreate {},
    BinUpdate { id: String },
    BinDelete { id: String },
    UserRetrieve { id: String },
    #[serde(rename_all = "camelCase")]
    Recycle { user_id: Option<String> },
    #[serde(rename_all = "camelCase")]
    Detections { user_id: String },
}

impl Context {
    pub fn register() -> Context {
        Context::Register {}
    }

    pub fn login() -> Context {
        Context::Login {}
    }

    pub fn bins_list() -> Context {
        Context::BinsList {}
    }

    pub fn bin_retrieve(id: String) -> Context {
        Context::BinRetrieve { id }
    }

    pub fn bin_create() -> Context {
        Context::BinCreate {}
    }

    pub fn bin_update(id: String) -> Context {
        Context::BinUpdate { id }
    }

    pub fn bin_delete(id: String) -> Context {
        Context::BinDelete { id }
    }

    pub fn user_retrieve(id: String) -> Context {
        Context::UserRetrieve { id }
    }

    pub fn recycle(user_id: Option<String>) -> Context {
        Context::Recycle { user_id }
    }

    pub fn detections(user_id: String) -> Context {
        Context::Detections { user_id }
    }
}
