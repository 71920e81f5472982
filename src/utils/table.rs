/// A plain-text table for console listings
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    col_widths: Vec<usize>,
    max_width: usize,
}

impl Table {
    const DEFAULT_MAX_WIDTH: usize = 40;

    /// Create a new table with the given headers
    pub fn new(headers: Vec<&str>) -> Self {
        let col_widths = headers.iter().map(|h| h.chars().count()).collect();
        let headers = headers.iter().map(|h| h.to_string()).collect();
        Table {
            headers,
            rows: Vec::new(),
            col_widths,
            max_width: Self::DEFAULT_MAX_WIDTH,
        }
    }

    /// Cells longer than `max_width` characters are cut with an ellipsis
    pub fn with_max_width(mut self, max_width: usize) -> Self {
        self.max_width = max_width.max(4);
        self
    }

    /// Add a row to the table
    pub fn add_row(&mut self, row: Vec<String>) {
        let row: Vec<String> = row.into_iter().map(|cell| self.clip(cell)).collect();

        for (i, col) in row.iter().enumerate() {
            if i < self.col_widths.len() {
                self.col_widths[i] = self.col_widths[i].max(col.chars().count());
            }
        }

        self.rows.push(row);
    }

    /// Render the table with a header separator
    pub fn render(&self) -> String {
        let mut output = String::new();

        output.push_str(&self.render_row(&self.headers));
        output.push('\n');
        output.push_str(&self.render_separator());
        output.push('\n');

        for row in &self.rows {
            output.push_str(&self.render_row(row));
            output.push('\n');
        }

        output
    }

    fn clip(&self, cell: String) -> String {
        if cell.chars().count() <= self.max_width {
            return cell;
        }
        let mut clipped: String = cell.chars().take(self.max_width - 3).collect();
        clipped.push_str("...");
        clipped
    }

    fn render_row(&self, row: &[String]) -> String {
        let mut line = String::new();
        for (i, col) in row.iter().enumerate() {
            if i < self.col_widths.len() {
                let width = self.col_widths[i];
                line.push_str(&format!("{:<width$}", col, width = width));
                if i < row.len() - 1 {
                    line.push_str(" | ");
                }
            }
        }
        line.trim_end().to_string()
    }

    fn render_separator(&self) -> String {
        let mut line = String::new();
        for (i, &width) in self.col_widths.iter().enumerate() {
            line.push_str(&"-".repeat(width));
            if i < self.col_widths.len() - 1 {
                line.push_str("-+-");
            }
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_table() {
        let mut table = Table::new(vec!["ID", "Monto", "Status"]);
        table.add_row(vec!["a1".to_string(), "100".to_string(), "pendiente".to_string()]);
        table.add_row(vec!["b2".to_string(), "7.5".to_string(), "procesado".to_string()]);

        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[1].contains("-+-"));
        assert!(rendered.contains("procesado"));
    }

    #[test]
    fn test_long_cells_are_clipped() {
        let mut table = Table::new(vec!["Summary"]).with_max_width(10);
        table.add_row(vec!["a very long summary text".to_string()]);

        assert!(table.render().contains("a very ..."));
    }
}
