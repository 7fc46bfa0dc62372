use crate::export::table::{column_widths, Cell, Tables, TabularRow};
use crate::utils::error::Result;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};

const HEADER_FILL: u32 = 0x4F81BD;

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin)
}

/// Renders both tables as an `.xlsx` workbook held in memory.
pub fn render_workbook(tables: &Tables) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = header_format();

    let businesses = workbook.add_worksheet();
    businesses.set_name("Businesses")?;
    write_sheet(businesses, &tables.businesses, &header)?;

    let reviews = workbook.add_worksheet();
    reviews.set_name("Reviews")?;
    write_sheet(reviews, &tables.reviews, &header)?;

    Ok(workbook.save_to_buffer()?)
}

fn write_sheet<R: TabularRow>(sheet: &mut Worksheet, rows: &[R], header: &Format) -> Result<()> {
    for (col, title) in R::HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, header)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let row_number = index as u32 + 1;
        for (col, cell) in row.cells().into_iter().enumerate() {
            match cell {
                Cell::Text(text) => sheet.write_string(row_number, col as u16, text)?,
                Cell::Number(value) => sheet.write_number(row_number, col as u16, value)?,
            };
        }
    }

    for (col, width) in column_widths(rows).into_iter().enumerate() {
        sheet.set_column_width(col as u16, width as f64)?;
    }

    Ok(())
}
