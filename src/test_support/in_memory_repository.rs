use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::entity::article::{Article, ArticleStatus};
use crate::domain::entity::user::User;
use crate::domain::repository::{ArticleRepository, UserRepository};

/// InMemoryArticleRepository は id 昇順で記事を保持するインメモリ記録系。
#[derive(Default)]
pub struct InMemoryArticleRepository {
    articles: RwLock<BTreeMap<i64, Article>>,
}

impl InMemoryArticleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// id 1..=count の公開済み記事を持つ記録系を作る。
    pub fn with_published(count: usize, title_prefix: &str) -> Self {
        let articles = (1..=count)
            .map(|n| {
                let id = i64::try_from(n).unwrap_or(i64::MAX);
                let mut article = Article::new(
                    1,
                    format!("{} {}", title_prefix, n),
                    format!("content {}", n),
                    ArticleStatus::Published,
                );
                article.id = id;
                (id, article)
            })
            .collect();
        Self {
            articles: RwLock::new(articles),
        }
    }

    pub async fn len(&self) -> usize {
        self.articles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.articles.read().await.is_empty()
    }
}

#[async_trait]
impl ArticleRepository for InMemoryArticleRepository {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Article>> {
        Ok(self.articles.read().await.get(&id).cloned())
    }

    async fn list(&self, page: u32, page_size: u32) -> anyhow::Result<Vec<Article>> {
        let skip = usize::try_from(page.saturating_sub(1))? * usize::try_from(page_size)?;
        Ok(self
            .articles
            .read()
            .await
            .values()
            .skip(skip)
            .take(usize::try_from(page_size)?)
            .cloned()
            .collect())
    }

    async fn create(&self, article: &Article) -> anyhow::Result<Article> {
        let mut articles = self.articles.write().await;
        let id = articles.keys().next_back().copied().unwrap_or(0) + 1;
        let mut created = article.clone();
        created.id = id;
        articles.insert(id, created.clone());
        Ok(created)
    }

    async fn update(&self, article: &Article) -> anyhow::Result<Option<Article>> {
        let mut articles = self.articles.write().await;
        match articles.get_mut(&article.id) {
            Some(stored) => {
                *stored = article.clone();
                Ok(Some(article.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        Ok(self.articles.write().await.remove(&id).is_some())
    }
}

/// InMemoryUserRepository はインメモリのユーザー記録系。
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_uid(&self, uid: &str) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.uid == uid).cloned())
    }

    async fn create(&self, user: &User) -> anyhow::Result<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.uid == user.uid) {
            anyhow::bail!("duplicate uid: {}", user.uid);
        }
        let mut created = user.clone();
        created.id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        users.push(created.clone());
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_pages_in_id_order_until_empty() {
        let repo = InMemoryArticleRepository::with_published(5, "a");
        let ids = |page: Vec<Article>| page.iter().map(|a| a.id).collect::<Vec<_>>();
        assert_eq!(ids(repo.list(1, 2).await.unwrap()), vec![1, 2]);
        assert_eq!(ids(repo.list(3, 2).await.unwrap()), vec![5]);
        assert!(repo.list(4, 2).await.unwrap().is_empty());
        assert!(InMemoryArticleRepository::new().is_empty().await);
    }

    #[tokio::test]
    async fn test_user_ids_are_assigned() {
        let repo = InMemoryUserRepository::new();
        let a = repo.create(&User::new("a")).await.unwrap();
        let b = repo.create(&User::new("b")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        tokio_test::assert_err!(repo.create(&User::new("a")).await);
        assert_eq!(repo.find_by_uid("b").await.unwrap().unwrap().id, 2);
    }
}
