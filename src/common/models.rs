use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------------------------

/// 漫画系列，由某个扩展源提供
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub id: String,           // 本地库中的ID
    pub extension_id: String, // 提供该系列的扩展源ID
    pub source_id: String,    // 扩展源内部的系列ID
    pub title: String,        // 系列标题
}

// -----------------------------------------------------------------------------------------------

/// 章节，下载任务的唯一标识就是章节的 `id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub source_id: String, // 扩展源内部的章节ID
    pub chapter_number: String,
    #[serde(default)]
    pub title: String,
}

impl Chapter {
    // 用于日志和界面的简短描述
    pub fn display_name(&self) -> String {
        if self.title.trim().is_empty() {
            format!("第{}话", self.chapter_number)
        } else {
            format!("第{}话 {}", self.chapter_number, self.title.trim())
        }
    }
}
