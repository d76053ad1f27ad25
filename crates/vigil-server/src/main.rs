//! Vigil Server — application entry point.
//!
//! Wires the in-memory store into the service layer. The HTTP routing
//! layer sits on top of these services and is intentionally thin.

use tracing_subscriber::EnvFilter;
use vigil_auth::{AuthConfig, AuthService, PrincipalResolver};
use vigil_service::{
    ApiKeyService, AuditLogService, IncidentService, ServiceConfig, TenantService,
    UsageQuotaService,
};
use vigil_store::{
    MemApiKeyRepository, MemAuditLogRepository, MemAuthRepository, MemIncidentRepository,
    MemTenantRepository, MemUsageRepository,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("vigil=info".parse().unwrap()))
        .json()
        .init();

    tracing::info!("starting vigil server");

    let auth_config = AuthConfig::default();
    let service_config = ServiceConfig::default();

    let auth_repo = MemAuthRepository::new();
    let tenant_repo = MemTenantRepository::new();
    let incident_repo = MemIncidentRepository::new();
    let api_key_repo = MemApiKeyRepository::new();
    let usage_repo = MemUsageRepository::new();
    let audit_repo = MemAuditLogRepository::new();

    let _resolver = PrincipalResolver::new(auth_repo.clone(), api_key_repo.clone());
    let _auth = AuthService::new(auth_repo.clone(), audit_repo.clone(), auth_config);
    let _tenants = TenantService::new(
        tenant_repo.clone(),
        auth_repo.clone(),
        audit_repo.clone(),
        service_config.clone(),
    );
    let _incidents = IncidentService::new(
        incident_repo.clone(),
        tenant_repo.clone(),
        usage_repo.clone(),
        audit_repo.clone(),
        &service_config,
    );
    let _api_keys = ApiKeyService::new(api_key_repo, tenant_repo.clone(), audit_repo.clone());
    let _quota = UsageQuotaService::new(usage_repo, tenant_repo.clone(), audit_repo.clone(), &service_config);
    let _audit_log = AuditLogService::new(audit_repo, tenant_repo);

    // TODO: mount the HTTP routing layer over these services.

    tracing::info!("vigil server stopped");
}
