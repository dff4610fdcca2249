use mongodb::{Client, Collection, Database};
use std::error::Error;
use std::time::Duration;

#[derive(Clone)]
pub struct MongoDB {
    client: Client,
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(Duration::from_secs(300));
        client_options.connect_timeout = Some(Duration::from_secs(5));
        client_options.server_selection_timeout = Some(Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        // Extract database name from URI or use default
        let db_name = uri
            .split('/')
            .last()
            .and_then(|s| s.split('?').next())
            .filter(|s| !s.is_empty())
            .unwrap_or("healthmate");

        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { client, db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes every per-user query path relies on, plus the
    /// unique email constraint and the TTL sweep for verification codes.
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        use mongodb::bson::doc;
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        let users = self.database().collection::<mongodb::bson::Document>("users");
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        match users.create_index(email_index).await {
            Ok(_) => log::info!("   ✅ Index created: users(email) unique"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let files = self.database().collection::<mongodb::bson::Document>("files");
        let files_index = IndexModel::builder()
            .keys(doc! { "userId": 1, "uploadDate": -1 })
            .build();
        match files.create_index(files_index).await {
            Ok(_) => log::info!("   ✅ Index created: files(userId, uploadDate)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let vitals = self.database().collection::<mongodb::bson::Document>("vitals");
        let vitals_index = IndexModel::builder()
            .keys(doc! { "userId": 1, "date": -1 })
            .build();
        match vitals.create_index(vitals_index).await {
            Ok(_) => log::info!("   ✅ Index created: vitals(userId, date)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let insights = self.database().collection::<mongodb::bson::Document>("ai_insights");
        let insights_user_index = IndexModel::builder()
            .keys(doc! { "userId": 1, "createdAt": -1 })
            .build();
        match insights.create_index(insights_user_index).await {
            Ok(_) => log::info!("   ✅ Index created: ai_insights(userId, createdAt)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        // Report-insight lookups go through the file back-reference
        let insights_file_index = IndexModel::builder()
            .keys(doc! { "fileId": 1 })
            .build();
        match insights.create_index(insights_file_index).await {
            Ok(_) => log::info!("   ✅ Index created: ai_insights(fileId)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        // Verification codes expire server-side; verify-time checks do not
        // depend on the sweep having run.
        let codes = self
            .database()
            .collection::<mongodb::bson::Document>("verification_codes");
        let ttl_index = IndexModel::builder()
            .keys(doc! { "expiresAt": 1 })
            .options(
                IndexOptions::builder()
                    .expire_after(Duration::from_secs(0))
                    .build(),
            )
            .build();
        match codes.create_index(ttl_index).await {
            Ok(_) => log::info!("   ✅ Index created: verification_codes(expiresAt) TTL"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}
