/*!

This is the long-form manual for `survey_pipeline` and `surveyclean`.

## Input formats

The following formats are supported:
* `csv` Comma Separated Values, UTF-8, with a header row
* `xlsx` Excel spreadsheet, as exported by Google Forms and Microsoft Forms

### `csv`

The first line is the header. Fields are separated by commas and may be quoted
with double quotes. Empty cells are missing values.

### `xlsx`

The first row of the worksheet is the header. The worksheet is selected with
the `--excel-worksheet-name` option; it may be omitted when the workbook only
has one worksheet.

## The cleaning steps

1. The administrative columns `Carimbo de data/hora`, `id` and `index` are removed.
2. Field names and text values are trimmed.
3. The eight percentage questions are read as numbers (a trailing `%` is
   allowed) and mapped to the levels 0, 25, 50, 75 and 100:

   | value            | level |
   |------------------|-------|
   | up to 12.5       | 0     |
   | up to 37.5       | 25    |
   | up to 62.5       | 50    |
   | up to 87.5       | 75    |
   | above 87.5       | 100   |

   Values that cannot be read (empty, `abc`, `%`) are at level 0.
4. The long question labels are renamed to short names (`Nome`, `Email`,
   `Ministérios`, `Assiduidade Célula`, ...). See
   [`PipelineRules::DEFAULT_RULES`](crate::PipelineRules::DEFAULT_RULES).
5. Text values are trimmed again.
6. The `Ministérios` field is split on commas: a member who participates in
   `Louvor, Dança` appears on two rows, one per ministry.
7. The rows are numbered from 0 and `Nome` becomes the first field.

## Summary

`surveyclean --summary stdout` prints, in JSON:
* the number of members at each level, for each percentage question
* the count of answers to each yes/no question
* the comparison of the answers to `Ganhou vidas em 2023?` and `Ganhou vidas em 2024?`
* the number of members who are in a relationship

Passing `--reference <file>` compares the summary with a previous one and fails
if they differ.

*/
