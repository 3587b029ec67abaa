//! OpenAPI document for the DataHub API.
use crate::api::system::HealthStatus;
use crate::api::{projects, subscriptions, system, topics};
use datahub_common::{
    CreateProjectRequest, CreateSubscriptionRequest, CreateSubscriptionResult, CreateTopicRequest,
    ErrorResponse, Field, FieldType, ListProjectResult, ListSubscriptionResult, ListTopicResult,
    Project, RecordSchema, RecordType, Subscription, SubscriptionState, Topic,
    UpdateProjectRequest, UpdateSubscriptionRequest, UpdateSubscriptionStateRequest,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "datahub-service",
        version = "v1",
        description = "DataHub project, topic and subscription HTTP API"
    ),
    paths(
        system::system_health,
        projects::list_projects,
        projects::create_project,
        projects::get_project,
        projects::update_project,
        projects::delete_project,
        topics::list_topics,
        topics::create_topic,
        topics::get_topic,
        topics::delete_topic,
        subscriptions::create_subscription,
        subscriptions::list_subscriptions,
        subscriptions::get_subscription,
        subscriptions::update_subscription,
        subscriptions::update_subscription_state,
        subscriptions::delete_subscription
    ),
    components(schemas(
        HealthStatus,
        ErrorResponse,
        Project,
        CreateProjectRequest,
        UpdateProjectRequest,
        ListProjectResult,
        Topic,
        CreateTopicRequest,
        ListTopicResult,
        RecordType,
        RecordSchema,
        Field,
        FieldType,
        Subscription,
        SubscriptionState,
        CreateSubscriptionRequest,
        CreateSubscriptionResult,
        UpdateSubscriptionRequest,
        UpdateSubscriptionStateRequest,
        ListSubscriptionResult
    )),
    tags(
        (name = "system", description = "Health and API description"),
        (name = "projects", description = "Project management"),
        (name = "topics", description = "Topic management"),
        (name = "subscriptions", description = "Subscription management")
    )
)]
pub struct ApiDoc;
