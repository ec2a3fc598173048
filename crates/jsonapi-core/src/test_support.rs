//! Hand-written `Resource` impls shared by the unit tests.

use crate::error::Result;
use crate::field::{FieldDecl, Schema};
use crate::relationship::{RelationField, Related};
use crate::resource::{FieldOut, Resource};
use crate::unmarshal::FieldReader;

#[derive(Debug, Default, PartialEq)]
pub struct Book {
    pub id: u32,
    pub title: String,
    pub pages: u32,
    pub author: Option<Related<Author>>,
    pub chapters: Vec<Related<Chapter>>,
}

impl Resource for Book {
    fn schema() -> Schema {
        Schema::new("Book")
            .field(FieldDecl::identifier("id", "books"))
            .field(FieldDecl::attribute("title", "title"))
            .field(FieldDecl::attribute("pages", "page-count").omit_empty())
            .field(FieldDecl::to_one::<Author>("author", "author"))
            .field(FieldDecl::to_many::<Chapter>("chapters", "chapters").embedded())
    }

    fn resource_id(&self) -> Option<String> {
        Some(self.id.to_string())
    }

    fn encode(&self) -> Vec<FieldOut<'_>> {
        vec![
            FieldOut::identifier(&self.id),
            FieldOut::attribute(&self.title),
            FieldOut::attribute(&self.pages),
            self.author.to_field_out(),
            self.chapters.to_field_out(),
        ]
    }

    fn decode(reader: &mut FieldReader<'_, '_>) -> Result<Self> {
        Ok(Self {
            id: reader.identifier()?,
            title: reader.attribute(1)?,
            pages: reader.attribute(2)?,
            author: reader.relation(3)?,
            chapters: reader.relation(4)?,
        })
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Author {
    pub id: u32,
    pub name: String,
    pub books: Vec<Related<Book>>,
}

impl Resource for Author {
    fn schema() -> Schema {
        Schema::new("Author")
            .field(FieldDecl::identifier("id", "authors"))
            .field(FieldDecl::attribute("name", "name"))
            .field(FieldDecl::relation::<Vec<Related<Book>>>("books", "books"))
    }

    fn resource_id(&self) -> Option<String> {
        Some(self.id.to_string())
    }

    fn encode(&self) -> Vec<FieldOut<'_>> {
        vec![
            FieldOut::identifier(&self.id),
            FieldOut::attribute(&self.name),
            self.books.to_field_out(),
        ]
    }

    fn decode(reader: &mut FieldReader<'_, '_>) -> Result<Self> {
        Ok(Self {
            id: reader.identifier()?,
            name: reader.attribute(1)?,
            books: reader.to_many(2)?,
        })
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Chapter {
    pub id: u32,
    pub title: String,
}

impl Resource for Chapter {
    fn schema() -> Schema {
        Schema::new("Chapter")
            .field(FieldDecl::identifier("id", "chapters"))
            .field(FieldDecl::attribute("title", "title"))
    }

    fn resource_id(&self) -> Option<String> {
        Some(self.id.to_string())
    }

    fn encode(&self) -> Vec<FieldOut<'_>> {
        vec![FieldOut::identifier(&self.id), FieldOut::attribute(&self.title)]
    }

    fn decode(reader: &mut FieldReader<'_, '_>) -> Result<Self> {
        Ok(Self {
            id: reader.identifier()?,
            title: reader.attribute(1)?,
        })
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Measured {
    pub id: u32,
    pub ratio: f64,
}

impl Resource for Measured {
    fn schema() -> Schema {
        Schema::new("Measured")
            .field(FieldDecl::identifier("id", "measurements"))
            .field(FieldDecl::attribute("ratio", "ratio"))
    }

    fn resource_id(&self) -> Option<String> {
        Some(self.id.to_string())
    }

    fn encode(&self) -> Vec<FieldOut<'_>> {
        vec![FieldOut::identifier(&self.id), FieldOut::attribute(&self.ratio)]
    }

    fn decode(reader: &mut FieldReader<'_, '_>) -> Result<Self> {
        Ok(Self {
            id: reader.identifier()?,
            ratio: reader.attribute(1)?,
        })
    }
}

/// Define a unit-struct resource with the given resource type and extra
/// declarations. An empty resource type declares no identifier. Encoding
/// yields no fields and decoding ignores the document.
macro_rules! hand_resource {
    ($name:ident, $resource_type:expr, [$($decl:expr),* $(,)?]) => {
        #[derive(Debug, Default, PartialEq)]
        struct $name;

        impl $crate::resource::Resource for $name {
            fn schema() -> $crate::field::Schema {
                let resource_type: &'static str = $resource_type;
                #[allow(unused_mut)]
                let mut schema = $crate::field::Schema::new(stringify!($name));
                if !resource_type.is_empty() {
                    schema = schema.field($crate::field::FieldDecl::identifier("id", resource_type));
                }
                $(schema = schema.field($decl);)*
                schema
            }

            fn resource_id(&self) -> Option<String> {
                None
            }

            fn encode(&self) -> Vec<$crate::resource::FieldOut<'_>> {
                Vec::new()
            }

            fn decode(
                _reader: &mut $crate::unmarshal::FieldReader<'_, '_>,
            ) -> $crate::error::Result<Self> {
                Ok(Self)
            }
        }
    };
}

pub(crate) use hand_resource;
