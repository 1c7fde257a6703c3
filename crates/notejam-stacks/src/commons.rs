//! Commons stack: container image repositories shared by every layer

use crate::error::Result;
use crate::spec::{OutputRef, ResourceSpec};
use notejam_core::Environment;
use serde::{Deserialize, Serialize};

pub const STACK_BASE_NAME: &str = "NoteJamCommons";

const TOMCAT_BASE_REPO_ID: &str = "TomcatBaseRepo";
const APP_REPO_ID: &str = "NoteJamRepo";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRepositorySpec {
    pub repository_name: String,
}

/// Handle to a provisioned image repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryHandle {
    pub repository_name: String,
    pub uri: OutputRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommonsStack {
    pub stack_name: String,
    pub tomcat_base_repo: ContainerRepositorySpec,
    pub app_repo: ContainerRepositorySpec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonsOutputs {
    pub tomcat_base_repo: RepositoryHandle,
    pub app_repo: RepositoryHandle,
}

impl CommonsStack {
    pub fn emit(environment: &Environment) -> Self {
        Self {
            stack_name: environment.scoped_name(STACK_BASE_NAME),
            tomcat_base_repo: ContainerRepositorySpec {
                repository_name: "tomcat-base".to_string(),
            },
            app_repo: ContainerRepositorySpec {
                repository_name: "note-jam".to_string(),
            },
        }
    }

    pub fn outputs(&self) -> CommonsOutputs {
        CommonsOutputs {
            tomcat_base_repo: RepositoryHandle {
                repository_name: self.tomcat_base_repo.repository_name.clone(),
                uri: OutputRef::new(&self.stack_name, TOMCAT_BASE_REPO_ID, "repository_uri"),
            },
            app_repo: RepositoryHandle {
                repository_name: self.app_repo.repository_name.clone(),
                uri: OutputRef::new(&self.stack_name, APP_REPO_ID, "repository_uri"),
            },
        }
    }

    pub fn resources(&self) -> Result<Vec<ResourceSpec>> {
        Ok(vec![
            ResourceSpec::new("container-repository", TOMCAT_BASE_REPO_ID, &self.tomcat_base_repo)?,
            ResourceSpec::new("container-repository", APP_REPO_ID, &self.app_repo)?,
        ])
    }

    pub fn consumed_refs(&self) -> Vec<OutputRef> {
        Vec::new()
    }
}
