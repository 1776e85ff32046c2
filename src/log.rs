use alloc::string::String;

use crate::{
    container_service::{ContainerService, ServiceStatus},
    dependency::{DependencyValue, ServiceDependency},
    utils::simple::dump_value,
};

const ERROR_ARROW: &str = " <---------------";

/// Renders a construction tree, one line per node, a tab per depth level
pub(crate) struct ConstructionLogWriter {
    buffer: String,
    indent: usize,
}

impl ConstructionLogWriter {
    #[inline]
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self {
            buffer: String::new(),
            indent: 0,
        }
    }

    fn begin_line(&mut self) {
        if !self.buffer.is_empty() {
            self.buffer.push('\n');
        }
        for _ in 0..self.indent {
            self.buffer.push('\t');
        }
    }

    pub(crate) fn write_service(&mut self, service: &ContainerService, used_from: Option<&ServiceDependency>) {
        self.begin_line();

        let status = used_from.map_or(service.status, |dependency| dependency.status);
        if status != ServiceStatus::Ok {
            self.buffer.push('!');
        }
        self.buffer.push_str(&service.type_info.short_name());
        if !service.used_contracts.is_empty() {
            self.buffer.push('[');
            self.buffer.push_str(&service.used_contracts.join("->"));
            self.buffer.push(']');
        }

        if status != ServiceStatus::Error {
            let comment = used_from
                .and_then(|dependency| dependency.comment.as_deref())
                .or(service.comment.as_deref());
            if let Some(comment) = comment {
                self.buffer.push_str(" - ");
                self.buffer.push_str(comment);
            }
        }
        if status == ServiceStatus::Error || matches!(service.status, ServiceStatus::Error | ServiceStatus::Failed) {
            self.buffer.push_str(ERROR_ARROW);
        }

        self.indent += 1;
        for dependency in &service.dependencies {
            self.write_dependency(dependency);
        }
        self.indent -= 1;
    }

    pub(crate) fn write_dependency(&mut self, dependency: &ServiceDependency) {
        if let Some(service) = &dependency.service {
            self.write_service(service, Some(dependency));
            return;
        }

        self.begin_line();
        if dependency.status != ServiceStatus::Ok {
            self.buffer.push('!');
        }
        self.buffer.push_str(&dependency.name);

        if dependency.status != ServiceStatus::Error {
            if let Some(comment) = &dependency.comment {
                self.buffer.push_str(" - ");
                self.buffer.push_str(comment);
            }
        }
        if dependency.status == ServiceStatus::Ok && dependency.constant {
            if let DependencyValue::Single(instance) = &dependency.value {
                match dump_value(instance) {
                    Some(value) => {
                        self.buffer.push_str(" -> ");
                        self.buffer.push_str(&value);
                    }
                    None => self.buffer.push_str(" const"),
                }
            }
        }
        if dependency.status == ServiceStatus::Error {
            self.buffer.push_str(ERROR_ARROW);
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn finish(self) -> String {
        self.buffer
    }
}
