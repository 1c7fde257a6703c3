//! Monitoring stack: database CPU alarm and alert topic

use crate::data_layer::DataLayerOutputs;
use crate::error::Result;
use crate::spec::{OutputRef, ResourceSpec};
use notejam_core::{Environment, TargetSettings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const STACK_BASE_NAME: &str = "NoteJamMonitoring";

const TOPIC_ID: &str = "AlertTopic";
const ALARM_ID: &str = "DbCpuAlarm";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSpec {
    pub topic_name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: BTreeMap<String, String>,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmSpec {
    pub alarm_name: String,
    pub metric: MetricSpec,
    pub evaluation_periods: u32,
    pub threshold: f64,
    /// Topics notified when the alarm fires.
    pub alarm_actions: Vec<String>,
}

/// Handle to the provisioned alert topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicHandle {
    pub topic_name: String,
    pub arn: OutputRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitoringStack {
    pub stack_name: String,
    pub alert_topic: TopicSpec,
    pub db_cpu_alarm: AlarmSpec,
    /// Typed wiring to the instance the alarm watches.
    pub monitored_instance: OutputRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoringOutputs {
    pub alert_topic: TopicHandle,
}

impl MonitoringStack {
    pub fn emit(
        environment: &Environment,
        target: &TargetSettings,
        data_layer: &DataLayerOutputs,
    ) -> Self {
        let stack_name = environment.scoped_name(STACK_BASE_NAME);

        let alert_topic = TopicSpec {
            topic_name: "NoteJamAlertTopic".to_string(),
            display_name: "NoteJamAlertTopic".to_string(),
        };

        let mut dimensions = BTreeMap::new();
        dimensions.insert(
            "DBInstanceIdentifier".to_string(),
            data_layer.instance_identifier.clone(),
        );

        let db_cpu_alarm = AlarmSpec {
            alarm_name: ALARM_ID.to_string(),
            metric: MetricSpec {
                namespace: "AWS/RDS".to_string(),
                metric_name: "CPUUtilization".to_string(),
                dimensions,
                region: target.region.to_string(),
            },
            evaluation_periods: 2,
            threshold: 70.0,
            alarm_actions: vec![alert_topic.topic_name.clone()],
        };

        Self {
            stack_name,
            alert_topic,
            db_cpu_alarm,
            monitored_instance: data_layer.instance.clone(),
        }
    }

    pub fn outputs(&self) -> MonitoringOutputs {
        MonitoringOutputs {
            alert_topic: TopicHandle {
                topic_name: self.alert_topic.topic_name.clone(),
                arn: OutputRef::new(&self.stack_name, TOPIC_ID, "topic_arn"),
            },
        }
    }

    pub fn resources(&self) -> Result<Vec<ResourceSpec>> {
        Ok(vec![
            ResourceSpec::new("alert-topic", TOPIC_ID, &self.alert_topic)?,
            ResourceSpec::new("metric-alarm", ALARM_ID, &self.db_cpu_alarm)?,
        ])
    }

    pub fn consumed_refs(&self) -> Vec<OutputRef> {
        vec![self.monitored_instance.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_layer::DataLayerStack;
    use crate::network::NetworkStack;
    use notejam_core::{target_settings, DeployContext};
    use notejam_network::{DEFAULT_MAX_AZS, VPC_CIDR};

    fn environment() -> Environment {
        Environment::resolve(&DeployContext {
            environment_type: Some("dev".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    fn monitoring() -> MonitoringStack {
        let env = environment();
        let network = NetworkStack::emit(&env, VPC_CIDR, DEFAULT_MAX_AZS).unwrap();
        let data_layer = DataLayerStack::emit(&env, &network.outputs()).unwrap();
        MonitoringStack::emit(
            &env,
            &target_settings(env.environment_type()),
            &data_layer.outputs(),
        )
    }

    #[test]
    fn test_alarm_watches_db_cpu() {
        let stack = monitoring();
        let alarm = &stack.db_cpu_alarm;
        assert_eq!(alarm.metric.namespace, "AWS/RDS");
        assert_eq!(alarm.metric.metric_name, "CPUUtilization");
        assert_eq!(alarm.metric.dimensions["DBInstanceIdentifier"], "Db");
        assert_eq!(alarm.threshold, 70.0);
        assert_eq!(alarm.evaluation_periods, 2);
    }

    #[test]
    fn test_alarm_fires_to_alert_topic() {
        let stack = monitoring();
        assert_eq!(
            stack.db_cpu_alarm.alarm_actions,
            vec!["NoteJamAlertTopic".to_string()]
        );
        assert_eq!(stack.outputs().alert_topic.topic_name, "NoteJamAlertTopic");
    }

    #[test]
    fn test_monitored_instance_points_at_data_layer() {
        let stack = monitoring();
        assert_eq!(stack.monitored_instance.stack, "NoteJamDataLayer");
        assert_eq!(stack.monitored_instance.resource, "Db");
    }
}
