pub struct Icons;

impl Icons {
    pub const FLASK: &str = "🧪";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const MERGE: &str = "🔀";
    pub const BOX: &str = "📦";
    pub const DATABASE: &str = "🗄️";
    pub const FILE: &str = "📄";
    pub const STAR: &str = "⭐";
}
