//! # 测试数据 Fixtures
//!
//! 账户及其主域名、别名、子域名和别名子域名

use chrono::Utc;
use entity::{accounts, domain_aliases, domains, subdomain_aliases, subdomains};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, NotSet, Set};

use crate::ssl_certs::{DomainRef, DomainType};

/// 账户测试数据构建器
pub struct AccountFixture {
    pub username: String,
    pub firm: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub email: Option<String>,
}

impl Default for AccountFixture {
    fn default() -> Self {
        Self {
            username: "customer1".to_string(),
            firm: Some("Example Hosting".to_string()),
            city: None,
            state: Some("Bavaria".to_string()),
            email: Some("admin@example.test".to_string()),
        }
    }
}

impl AccountFixture {
    /// 设置用户名
    pub fn username(mut self, username: &str) -> Self {
        self.username = username.to_string();
        self
    }

    /// 清空所有主题资料
    pub fn without_profile(mut self) -> Self {
        self.firm = None;
        self.city = None;
        self.state = None;
        self.email = None;
        self
    }

    fn to_active_model(&self) -> accounts::ActiveModel {
        accounts::ActiveModel {
            id: NotSet,
            username: Set(self.username.clone()),
            firm: Set(self.firm.clone()),
            city: Set(self.city.clone()),
            state: Set(self.state.clone()),
            country: Set(Some("DE".to_string())),
            email: Set(self.email.clone()),
            created_at: Set(Utc::now().naive_utc()),
        }
    }
}

/// 已写入数据库的一组域名实体
#[derive(Debug, Clone)]
pub struct TestFixtures {
    pub account: accounts::Model,
    pub domain: domains::Model,
    pub alias: domain_aliases::Model,
    pub subdomain: subdomains::Model,
    pub alias_subdomain: subdomain_aliases::Model,
}

impl TestFixtures {
    /// 写入默认账户及其域名实体
    pub async fn seed(db: &DatabaseConnection) -> Result<Self, DbErr> {
        Self::seed_with(db, AccountFixture::default(), "example.test").await
    }

    /// 写入指定账户，域名实体以 `domain_name` 为基础命名
    pub async fn seed_with(
        db: &DatabaseConnection,
        account: AccountFixture,
        domain_name: &str,
    ) -> Result<Self, DbErr> {
        let account = account.to_active_model().insert(db).await?;

        let domain = domains::ActiveModel {
            id: NotSet,
            owner_id: Set(account.id),
            domain_name: Set(domain_name.to_string()),
            domain_status: Set("ok".to_string()),
        }
        .insert(db)
        .await?;

        let alias_name = domain_name.replacen('.', "-alias.", 1);
        let alias = domain_aliases::ActiveModel {
            id: NotSet,
            domain_id: Set(domain.id),
            alias_name: Set(alias_name),
            alias_status: Set("ok".to_string()),
        }
        .insert(db)
        .await?;

        let subdomain = subdomains::ActiveModel {
            id: NotSet,
            domain_id: Set(domain.id),
            subdomain_name: Set("blog".to_string()),
            subdomain_status: Set("ok".to_string()),
        }
        .insert(db)
        .await?;

        let alias_subdomain = subdomain_aliases::ActiveModel {
            id: NotSet,
            alias_id: Set(alias.id),
            subdomain_alias_name: Set("shop".to_string()),
            subdomain_alias_status: Set("ok".to_string()),
        }
        .insert(db)
        .await?;

        Ok(Self {
            account,
            domain,
            alias,
            subdomain,
            alias_subdomain,
        })
    }

    pub fn domain_ref(&self) -> DomainRef {
        DomainRef::new(self.domain.id, DomainType::Primary)
    }

    pub fn alias_ref(&self) -> DomainRef {
        DomainRef::new(self.alias.id, DomainType::Alias)
    }

    pub fn subdomain_ref(&self) -> DomainRef {
        DomainRef::new(self.subdomain.id, DomainType::Subdomain)
    }

    pub fn alias_subdomain_ref(&self) -> DomainRef {
        DomainRef::new(self.alias_subdomain.id, DomainType::AliasSubdomain)
    }
}
