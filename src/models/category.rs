use serde::{Deserialize, Serialize};
use std::fmt;

/// 题目分类（数据库中的一行）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub name_ru: String,
    pub slug: String,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[分类 #{} {}]", self.id, self.name)
    }
}

/// 待写入的分类种子
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub name_ru: String,
    pub slug: String,
}

impl NewCategory {
    fn new(name: &str, name_ru: &str, slug: &str) -> Self {
        Self {
            name: name.to_string(),
            name_ru: name_ru.to_string(),
            slug: slug.to_string(),
        }
    }
}

/// 内置的 Java 主题分类
pub fn default_categories() -> Vec<NewCategory> {
    vec![
        NewCategory::new("Java Basics", "Основы Java", "java-basics"),
        NewCategory::new(
            "Object-Oriented Programming",
            "Объектно-ориентированное программирование",
            "oop",
        ),
        NewCategory::new("Classes and Objects", "Классы и Объекты", "classes-and-objects"),
        NewCategory::new("Collections Framework", "Коллекции", "collections"),
        NewCategory::new("Multithreading", "Многопоточность", "multithreading"),
    ]
}
